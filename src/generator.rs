//! Runs the stages of road generation end to end.

use crate::error::Result;
use crate::geometry::{BuildOptions, GeneratedGeometry, GeometryBuilder, StyleResolver};
use crate::grammar::{expand, GrammarConfig};
use crate::network::{Assembler, AssemblyOptions, RoadNetwork};
use crate::turtle::interpret;
use serde::{Deserialize, Serialize};

/// The configuration of every stage, loadable from a single document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub grammar: GrammarConfig,
    pub assembly: AssemblyOptions,
    pub geometry: BuildOptions,
}

/// Expands a grammar, traces it and assembles the segments into a network.
pub fn generate_network(grammar: &GrammarConfig, options: &AssemblyOptions) -> Result<RoadNetwork> {
    let symbols = expand(grammar)?;
    let segments = interpret(&symbols, grammar)?;
    let network = Assembler::new(options.clone()).assemble(&segments)?;
    Ok(network)
}

/// Generates a network and builds its geometry.
pub fn generate<R>(config: &GeneratorConfig, resolver: &R) -> Result<(RoadNetwork, GeneratedGeometry)>
where
    R: StyleResolver + ?Sized,
{
    let network = generate_network(&config.grammar, &config.assembly)?;
    let geometry = GeometryBuilder::new(config.geometry.clone()).build(&network, resolver)?;
    Ok((network, geometry))
}
