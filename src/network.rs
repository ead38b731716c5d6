//! The canonical road network.
//!
//! A [RoadNetwork] is built once by the [Assembler] (or imported from JSON) and is
//! read-only afterwards. Nodes own the list of segments incident to them; segments
//! reference exactly two distinct nodes.

use crate::error::{GeometryWarning, GraphError};
use crate::math::{heading_of, Point2d, SpatialGrid, Vector2d};
use crate::turtle::RoadSegment;
use crate::{NodeId, SegmentId};
use cgmath::prelude::*;
use pathfinding::undirected::connected_components::connected_components;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use smallvec::SmallVec;
use std::collections::HashMap;

pub use assemble::{assemble, Assembler, AssemblyOptions};
pub use classify::{IntersectionType, JunctionRules};
pub use interchange::{IntersectionRecord, NetworkDocument, NodeRecord, SegmentRecord};

mod assemble;
mod classify;
mod cluster;
mod interchange;

/// The merge tolerance used when none is given, in m.
pub const DEFAULT_MERGE_TOLERANCE: f64 = 0.01;

/// A point where one or more road segments end.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoadNode {
    id: NodeId,
    position: Point2d,
    elevation: f64,
    incident: SmallVec<[SegmentId; 4]>,
}

/// A road segment joining two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoadEdge {
    id: SegmentId,
    from: NodeId,
    to: NodeId,
    /// The heading at creation time, in radians.
    heading: f64,
    style_class: String,
    /// The id of the segment this edge was assembled from.
    source: usize,
}

/// A node of a network under construction, referenced by index.
pub(crate) struct NodeSpec {
    pub position: Point2d,
    pub elevation: f64,
}

/// A segment of a network under construction, referencing nodes by index.
pub(crate) struct EdgeSpec {
    pub from: usize,
    pub to: usize,
    pub heading: f64,
    pub style_class: String,
    pub source: usize,
}

/// An assembled road network.
#[derive(Clone, Debug)]
pub struct RoadNetwork {
    name: String,
    merge_tolerance: f64,
    rules: JunctionRules,
    nodes: SlotMap<NodeId, RoadNode>,
    segments: SlotMap<SegmentId, RoadEdge>,
    warnings: Vec<GeometryWarning>,
}

/// Counts describing a network.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub nodes: usize,
    pub segments: usize,
    /// The sum of all segment lengths in m.
    pub total_length: f64,
    pub dead_ends: usize,
    pub pass_throughs: usize,
    pub t_junctions: usize,
    pub four_ways: usize,
    pub roundabouts: usize,
    pub unclassified: usize,
    pub components: usize,
}

impl RoadNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> Point2d {
        self.position
    }

    /// The fixed elevation of the node in m.
    pub fn elevation(&self) -> f64 {
        self.elevation
    }

    /// The segments which start or end at this node.
    pub fn incident(&self) -> &[SegmentId] {
        &self.incident
    }

    /// The number of incident segments.
    pub fn degree(&self) -> usize {
        self.incident.len()
    }
}

impl RoadEdge {
    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn from(&self) -> NodeId {
        self.from
    }

    pub fn to(&self) -> NodeId {
        self.to
    }

    /// The heading of the segment when it was drawn, in radians.
    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn style_class(&self) -> &str {
        &self.style_class
    }

    /// The id of the pre-merge segment this edge came from.
    pub fn source(&self) -> usize {
        self.source
    }

    /// Gets the node at the opposite end from `node`.
    pub fn other_end(&self, node: NodeId) -> Option<NodeId> {
        if node == self.from {
            Some(self.to)
        } else if node == self.to {
            Some(self.from)
        } else {
            None
        }
    }
}

impl RoadNetwork {
    /// Builds a network from index-based parts, deriving incidence lists.
    pub(crate) fn from_parts(
        name: String,
        merge_tolerance: f64,
        rules: JunctionRules,
        node_specs: Vec<NodeSpec>,
        edge_specs: Vec<EdgeSpec>,
        warnings: Vec<GeometryWarning>,
    ) -> Self {
        let mut nodes = SlotMap::with_capacity_and_key(node_specs.len());
        let node_ids = node_specs
            .into_iter()
            .map(|spec| {
                nodes.insert_with_key(|id| RoadNode {
                    id,
                    position: spec.position,
                    elevation: spec.elevation,
                    incident: SmallVec::new(),
                })
            })
            .collect::<Vec<NodeId>>();

        let mut segments = SlotMap::with_capacity_and_key(edge_specs.len());
        for spec in edge_specs {
            let (from, to) = (node_ids[spec.from], node_ids[spec.to]);
            let id = segments.insert_with_key(|id| RoadEdge {
                id,
                from,
                to,
                heading: spec.heading,
                style_class: spec.style_class,
                source: spec.source,
            });
            nodes[from].incident.push(id);
            nodes[to].incident.push(id);
        }

        Self {
            name,
            merge_tolerance,
            rules,
            nodes,
            segments,
            warnings,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The distance within which endpoints were merged, in m.
    pub fn merge_tolerance(&self) -> f64 {
        self.merge_tolerance
    }

    pub fn junction_rules(&self) -> &JunctionRules {
        &self.rules
    }

    /// The recoverable issues found while assembling the network.
    pub fn warnings(&self) -> &[GeometryWarning] {
        &self.warnings
    }

    pub fn node(&self, id: NodeId) -> Option<&RoadNode> {
        self.nodes.get(id)
    }

    pub fn segment(&self, id: SegmentId) -> Option<&RoadEdge> {
        self.segments.get(id)
    }

    /// Returns an iterator over the nodes, in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &RoadNode> {
        self.nodes.values()
    }

    /// Returns an iterator over the segments, in creation order.
    pub fn segments(&self) -> impl Iterator<Item = &RoadEdge> {
        self.segments.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Gets the start and end positions of a segment.
    pub fn segment_endpoints(&self, id: SegmentId) -> Option<(Point2d, Point2d)> {
        let edge = self.segments.get(id)?;
        Some((
            self.nodes.get(edge.from)?.position,
            self.nodes.get(edge.to)?.position,
        ))
    }

    /// Gets the length of a segment in m.
    pub fn segment_length(&self, id: SegmentId) -> Option<f64> {
        self.segment_endpoints(id).map(|(a, b)| a.distance(b))
    }

    /// Gets the unit vector pointing from `node` along `segment` towards its other end.
    pub fn approach(&self, node: NodeId, segment: SegmentId) -> Option<Vector2d> {
        let edge = self.segments.get(segment)?;
        let other = edge.other_end(node)?;
        let dir = self.nodes.get(other)?.position - self.nodes.get(node)?.position;
        (dir.magnitude2() > 0.0).then(|| dir.normalize())
    }

    /// Classifies a node by the number and arrangement of its incident segments.
    ///
    /// Returns `None` for dead ends and for shapes that match no intersection type.
    pub fn intersection_type(&self, node: NodeId) -> Option<IntersectionType> {
        let approaches = self
            .nodes
            .get(node)?
            .incident
            .iter()
            .filter_map(|segment| self.approach(node, *segment))
            .collect::<SmallVec<[Vector2d; 4]>>();
        self.rules.classify(&approaches)
    }

    /// Returns every classified node with its intersection type, in node order.
    pub fn intersections(&self) -> impl Iterator<Item = (NodeId, IntersectionType)> + '_ {
        self.nodes
            .keys()
            .filter_map(|id| self.intersection_type(id).map(|kind| (id, kind)))
    }

    /// Checks the network invariants: every segment joins two distinct existing nodes,
    /// incidence lists agree with the segments, and no two nodes lie within the merge
    /// tolerance of each other.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut expected: HashMap<NodeId, Vec<SegmentId>> = HashMap::new();
        for edge in self.segments.values() {
            for node in [edge.from, edge.to] {
                if !self.nodes.contains_key(node) {
                    return Err(GraphError::UnknownNode {
                        segment: label(edge.id),
                        node: label(node),
                    });
                }
            }
            if edge.from == edge.to {
                return Err(GraphError::SelfLoop {
                    segment: label(edge.id),
                });
            }
            expected.entry(edge.from).or_default().push(edge.id);
            expected.entry(edge.to).or_default().push(edge.id);
        }

        for node in self.nodes.values() {
            let mut actual = node.incident.to_vec();
            let mut wanted = expected.remove(&node.id).unwrap_or_default();
            actual.sort();
            wanted.sort();
            if actual != wanted {
                return Err(GraphError::IncidenceMismatch {
                    node: label(node.id),
                });
            }
        }

        let mut grid = SpatialGrid::new(self.merge_tolerance);
        let nodes = self.nodes.values().collect::<Vec<_>>();
        for (i, node) in nodes.iter().enumerate() {
            for j in grid.candidates(node.position) {
                let distance = nodes[j].position.distance(node.position);
                if distance <= self.merge_tolerance {
                    return Err(GraphError::NodesTooClose {
                        a: label(nodes[j].id),
                        b: label(node.id),
                        distance,
                    });
                }
            }
            grid.insert(i, node.position);
        }

        Ok(())
    }

    /// Groups the nodes into connected components, each sorted in node order.
    pub fn components(&self) -> Vec<Vec<NodeId>> {
        let starts = self.nodes.keys().collect::<Vec<_>>();
        let mut components = connected_components(&starts, |id| {
            let edges = &self.segments;
            self.nodes[*id]
                .incident
                .iter()
                .filter_map(|s| edges.get(*s))
                .filter_map(|edge| edge.other_end(*id))
                .collect::<Vec<_>>()
        })
        .into_iter()
        .map(|set| {
            let mut nodes = set.into_iter().collect::<Vec<_>>();
            nodes.sort();
            nodes
        })
        .collect::<Vec<_>>();
        components.sort();
        components
    }

    /// Computes summary counts for the network.
    pub fn summary(&self) -> NetworkSummary {
        let mut summary = NetworkSummary {
            nodes: self.nodes.len(),
            segments: self.segments.len(),
            total_length: self
                .segments
                .keys()
                .filter_map(|id| self.segment_length(id))
                .sum(),
            components: self.components().len(),
            ..Default::default()
        };
        for node in self.nodes.values() {
            match (node.degree(), self.intersection_type(node.id)) {
                (_, Some(IntersectionType::Pass)) => summary.pass_throughs += 1,
                (_, Some(IntersectionType::T3Way)) => summary.t_junctions += 1,
                (_, Some(IntersectionType::FourWay)) => summary.four_ways += 1,
                (_, Some(IntersectionType::Roundabout)) => summary.roundabouts += 1,
                (0 | 1, None) => summary.dead_ends += 1,
                (_, None) => summary.unclassified += 1,
            }
        }
        summary
    }

    /// Converts the segments back into unmerged turtle segments, in segment order.
    pub fn to_segments(&self) -> Vec<RoadSegment> {
        self.segments
            .values()
            .filter_map(|edge| {
                let (start, end) = self.segment_endpoints(edge.id)?;
                Some((edge, start, end))
            })
            .enumerate()
            .map(|(id, (edge, start, end))| RoadSegment {
                id,
                start,
                end,
                heading: heading_of(end - start),
                style_class: edge.style_class.clone(),
            })
            .collect()
    }
}

/// Formats a key for error messages.
fn label(key: impl slotmap::Key) -> String {
    format!("{:?}", key.data())
}
