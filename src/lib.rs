//! Procedural road networks from L-system grammars.
//!
//! Generation runs in four stages:
//!
//! 1. [grammar::expand] rewrites an axiom with production rules into a [SymbolStream].
//! 2. [turtle::interpret] walks the symbols with a turtle, emitting straight [RoadSegment]s.
//! 3. [network::Assembler] merges coincident endpoints into a [RoadNetwork] of shared
//!    nodes, which can be exchanged as JSON.
//! 4. [geometry::GeometryBuilder] sweeps a cross-section along every segment and patches
//!    every intersection, producing plain mesh buffers.
//!
//! [generate_network] and [generate] run the stages back to back.

pub use cgmath;
pub use error::{ConfigError, Error, GeometryWarning, GraphError, Result};
pub use generator::{generate, generate_network, GeneratorConfig};
pub use geometry::{
    build, BuildOptions, BuildState, GeneratedGeometry, GeometryBuilder, StyleCatalog,
    StyleProfile, StyleResolver,
};
pub use grammar::{expand, Grammar, GrammarConfig, Production, SymbolStream};
pub use network::{
    assemble, Assembler, AssemblyOptions, IntersectionType, JunctionRules, NetworkDocument,
    NetworkSummary, RoadEdge, RoadNetwork, RoadNode,
};
use slotmap::new_key_type;
pub use slotmap::{Key, KeyData};
pub use turtle::{interpret, Interpreter, RoadSegment, TurtleOp, TurtleState};
pub use util::Interval;

mod error;
mod generator;
pub mod geometry;
pub mod grammar;
pub mod math;
pub mod network;
pub mod turtle;
mod util;

new_key_type! {
    /// Unique ID of a [RoadNode].
    pub struct NodeId;
    /// Unique ID of a [RoadEdge].
    pub struct SegmentId;
}
