use super::cluster::cluster_points;
use super::{EdgeSpec, JunctionRules, NodeSpec, RoadNetwork, DEFAULT_MERGE_TOLERANCE};
use crate::error::{GeometryWarning, GraphError};
use crate::turtle::RoadSegment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters for assembling turtle segments into a network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyOptions {
    /// The name given to the network.
    pub name: String,
    /// Endpoints closer than this are merged into one node, in m.
    pub merge_tolerance: f64,
    /// The elevation given to every node, in m.
    pub elevation: f64,
    /// How nodes are classified into intersection types.
    pub junctions: JunctionRules,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            name: "network".to_owned(),
            merge_tolerance: DEFAULT_MERGE_TOLERANCE,
            elevation: 0.0,
            junctions: JunctionRules::default(),
        }
    }
}

impl AssemblyOptions {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_merge_tolerance(mut self, merge_tolerance: f64) -> Self {
        self.merge_tolerance = merge_tolerance;
        self
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = elevation;
        self
    }

    pub fn with_junctions(mut self, junctions: JunctionRules) -> Self {
        self.junctions = junctions;
        self
    }
}

/// Merges coincident segment endpoints into shared nodes.
#[derive(Clone, Debug, Default)]
pub struct Assembler {
    options: AssemblyOptions,
}

impl Assembler {
    pub fn new(options: AssemblyOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    /// Builds a road network from turtle segments.
    ///
    /// Segments whose endpoints merge into one node, and segments joining the same
    /// pair of nodes as an earlier segment, are dropped with a warning. Nodes are
    /// placed at the centroid of their merged endpoints and keep the order in which
    /// their first endpoint was emitted.
    pub fn assemble(&self, segments: &[RoadSegment]) -> Result<RoadNetwork, GraphError> {
        let tolerance = self.options.merge_tolerance;
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(GraphError::InvalidTolerance(tolerance));
        }
        self.options.junctions.validate()?;

        let endpoints = segments
            .iter()
            .flat_map(|segment| [segment.start, segment.end])
            .collect::<Vec<_>>();
        let clustering = cluster_points(&endpoints, tolerance);

        let mut warnings = Vec::new();
        let mut kept = Vec::new();
        let mut seen: HashMap<(usize, usize), usize> = HashMap::new();
        for (i, segment) in segments.iter().enumerate() {
            let (a, b) = (clustering.assignment[2 * i], clustering.assignment[2 * i + 1]);
            if a == b {
                log::warn!("segment {} collapsed to a single node", segment.id);
                warnings.push(GeometryWarning::DegenerateSegment {
                    segment: segment.id,
                });
                continue;
            }
            if let Some(first) = seen.get(&(a.min(b), a.max(b))) {
                log::warn!("segment {} duplicates segment {}", segment.id, first);
                warnings.push(GeometryWarning::DuplicateSegment {
                    segment: segment.id,
                    duplicate_of: *first,
                });
                continue;
            }
            seen.insert((a.min(b), a.max(b)), segment.id);
            kept.push((segment, a, b));
        }

        // Only clusters touched by a kept segment become nodes
        let mut node_index = vec![None; clustering.centroids.len()];
        for (_, a, b) in &kept {
            node_index[*a] = Some(0);
            node_index[*b] = Some(0);
        }
        let mut node_specs = Vec::new();
        for (cluster, index) in node_index.iter_mut().enumerate() {
            if index.is_some() {
                *index = Some(node_specs.len());
                node_specs.push(NodeSpec {
                    position: clustering.centroids[cluster],
                    elevation: self.options.elevation,
                });
            }
        }

        let edge_specs = kept
            .into_iter()
            .filter_map(|(segment, a, b)| {
                Some(EdgeSpec {
                    from: node_index[a]?,
                    to: node_index[b]?,
                    heading: segment.heading,
                    style_class: segment.style_class.clone(),
                    source: segment.id,
                })
            })
            .collect();

        let network = RoadNetwork::from_parts(
            self.options.name.clone(),
            tolerance,
            self.options.junctions.clone(),
            node_specs,
            edge_specs,
            warnings,
        );
        let summary = network.summary();
        log::info!(
            "assembled '{}': {} nodes, {} segments, {:.1} m of road, {} warnings",
            network.name(),
            summary.nodes,
            summary.segments,
            summary.total_length,
            network.warnings().len()
        );
        Ok(network)
    }
}

/// Assembles segments into a network using default options and the given merge tolerance.
pub fn assemble(segments: &[RoadSegment], merge_tolerance: f64) -> Result<RoadNetwork, GraphError> {
    Assembler::new(AssemblyOptions::default().with_merge_tolerance(merge_tolerance))
        .assemble(segments)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Point2d;
    use crate::network::IntersectionType;
    use assert_approx_eq::assert_approx_eq;

    fn segment(id: usize, start: (f64, f64), end: (f64, f64)) -> RoadSegment {
        let (start, end) = (Point2d::new(start.0, start.1), Point2d::new(end.0, end.1));
        RoadSegment {
            id,
            start,
            end,
            heading: crate::math::heading_of(end - start),
            style_class: "local".to_owned(),
        }
    }

    #[test]
    fn shared_endpoints_become_one_node() {
        let segments = [
            segment(0, (0.0, 0.0), (10.0, 0.0)),
            segment(1, (10.004, 0.0), (10.0, 10.0)),
            segment(2, (10.0, 0.0), (20.0, 0.0)),
        ];
        let network = assemble(&segments, 0.01).unwrap();
        assert_eq!(network.node_count(), 4);
        assert_eq!(network.segment_count(), 3);
        assert!(network.warnings().is_empty());
        network.validate().unwrap();

        let hub = network.nodes().nth(1).unwrap();
        assert_eq!(hub.degree(), 3);
        assert_approx_eq!(hub.position().x, (10.0 + 10.004 + 10.0) / 3.0);
        assert_eq!(
            network.intersection_type(hub.id()),
            Some(IntersectionType::T3Way)
        );
    }

    #[test]
    fn edges_remember_their_source() {
        let segments = [
            segment(4, (0.0, 0.0), (0.0, 0.0)),
            segment(5, (0.0, 0.0), (5.0, 0.0)),
        ];
        let network = assemble(&segments, 0.01).unwrap();
        let edge = network.segments().next().unwrap();
        assert_eq!(edge.source(), 5);
        assert_eq!(edge.style_class(), "local");
        assert_eq!(
            network.warnings(),
            [GeometryWarning::DegenerateSegment { segment: 4 }]
        );
    }

    #[test]
    fn doubled_back_segments_are_dropped() {
        let segments = [
            segment(0, (0.0, 0.0), (10.0, 0.0)),
            segment(1, (10.0, 0.0), (0.0, 0.0)),
        ];
        let network = assemble(&segments, 0.01).unwrap();
        assert_eq!(network.segment_count(), 1);
        assert_eq!(network.node_count(), 2);
        assert_eq!(
            network.warnings(),
            [GeometryWarning::DuplicateSegment {
                segment: 1,
                duplicate_of: 0
            }]
        );
    }

    #[test]
    fn unreferenced_clusters_have_no_node() {
        let segments = [
            segment(0, (50.0, 50.0), (50.005, 50.0)),
            segment(1, (0.0, 0.0), (10.0, 0.0)),
        ];
        let network = assemble(&segments, 0.01).unwrap();
        assert_eq!(network.node_count(), 2);
        assert!(network.nodes().all(|node| node.degree() == 1));
    }

    #[test]
    fn reassembly_is_stable() {
        let segments = [
            segment(0, (0.0, 0.0), (10.0, 0.0)),
            segment(1, (10.003, 0.002), (10.0, 10.0)),
            segment(2, (9.998, 10.001), (0.0, 10.0)),
            segment(3, (0.0, 10.0), (0.004, 0.0)),
        ];
        let first = assemble(&segments, 0.01).unwrap();
        let second = assemble(&first.to_segments(), 0.01).unwrap();
        assert_eq!(first.node_count(), second.node_count());
        assert_eq!(first.segment_count(), second.segment_count());
        for (a, b) in first.nodes().zip(second.nodes()) {
            assert_approx_eq!(a.position().x, b.position().x);
            assert_approx_eq!(a.position().y, b.position().y);
            assert_eq!(a.degree(), b.degree());
        }
    }

    #[test]
    fn bad_parameters_are_rejected() {
        let segments = [segment(0, (0.0, 0.0), (10.0, 0.0))];
        assert_eq!(
            assemble(&segments, 0.0).unwrap_err(),
            GraphError::InvalidTolerance(0.0)
        );
        assert!(matches!(
            assemble(&segments, f64::NAN),
            Err(GraphError::InvalidTolerance(_))
        ));
        let options = AssemblyOptions::default().with_junctions(JunctionRules {
            intersection_radius: -2.0,
            ..Default::default()
        });
        assert_eq!(
            Assembler::new(options).assemble(&segments).unwrap_err(),
            GraphError::InvalidRadius(-2.0)
        );
    }

    #[test]
    fn empty_input_gives_empty_network() {
        let network = assemble(&[], 0.01).unwrap();
        assert_eq!(network.node_count(), 0);
        assert_eq!(network.summary().components, 0);
    }
}
