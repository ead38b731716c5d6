//! The JSON interchange form of a road network.

use super::{
    EdgeSpec, IntersectionType, JunctionRules, NodeSpec, RoadNetwork, DEFAULT_MERGE_TOLERANCE,
};
use crate::error::{GraphError, Result};
use crate::math::{heading_of, Point2d};
use crate::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A serialisable snapshot of a road network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkDocument {
    pub name: String,
    /// The tolerance the network was merged with; the default is assumed when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_tolerance: Option<f64>,
    /// The classification parameters; defaults with radii taken from the
    /// intersection records are assumed when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub junctions: Option<JunctionRules>,
    pub nodes: Vec<NodeRecord>,
    pub segments: Vec<SegmentRecord>,
    #[serde(default)]
    pub intersections: Vec<IntersectionRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    /// The x, y and elevation of the node.
    pub position: [f64; 3],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub id: String,
    pub from: String,
    pub to: String,
    pub style_class: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntersectionRecord {
    pub node_id: String,
    #[serde(rename = "type")]
    pub kind: IntersectionType,
    pub radius: f64,
}

impl RoadNetwork {
    /// Converts the network to its interchange form. Nodes and segments are
    /// labelled `n0, n1, ...` and `s0, s1, ...` in network order.
    pub fn to_document(&self) -> NetworkDocument {
        let node_labels = self
            .nodes
            .keys()
            .enumerate()
            .map(|(i, id)| (id, format!("n{}", i)))
            .collect::<HashMap<NodeId, String>>();
        let node_label = |id: NodeId| node_labels.get(&id).cloned().unwrap_or_default();

        let nodes = self
            .nodes
            .values()
            .map(|node| NodeRecord {
                id: node_label(node.id),
                position: [node.position.x, node.position.y, node.elevation],
            })
            .collect();

        let segments = self
            .segments
            .values()
            .enumerate()
            .map(|(i, edge)| SegmentRecord {
                id: format!("s{}", i),
                from: node_label(edge.from),
                to: node_label(edge.to),
                style_class: edge.style_class.clone(),
            })
            .collect();

        let intersections = self
            .intersections()
            .map(|(id, kind)| IntersectionRecord {
                node_id: node_label(id),
                kind,
                radius: self.rules.radius_for(kind),
            })
            .collect();

        NetworkDocument {
            name: self.name.clone(),
            merge_tolerance: Some(self.merge_tolerance),
            junctions: Some(self.rules.clone()),
            nodes,
            segments,
            intersections,
        }
    }

    /// Rebuilds a network from its interchange form.
    ///
    /// Segment headings are recomputed from the node positions. Intersection types
    /// are derived again from the rebuilt graph; records that disagree are logged.
    pub fn from_document(document: &NetworkDocument) -> Result<Self, GraphError> {
        let merge_tolerance = document.merge_tolerance.unwrap_or(DEFAULT_MERGE_TOLERANCE);
        if !merge_tolerance.is_finite() || merge_tolerance <= 0.0 {
            return Err(GraphError::InvalidTolerance(merge_tolerance));
        }

        let mut node_index = HashMap::new();
        let mut node_specs = Vec::with_capacity(document.nodes.len());
        for record in &document.nodes {
            if node_index
                .insert(record.id.as_str(), node_specs.len())
                .is_some()
            {
                return Err(GraphError::DuplicateId(record.id.clone()));
            }
            let [x, y, z] = record.position;
            node_specs.push(NodeSpec {
                position: Point2d::new(x, y),
                elevation: z,
            });
        }

        let mut segment_ids = HashSet::new();
        let mut edge_specs = Vec::with_capacity(document.segments.len());
        for (source, record) in document.segments.iter().enumerate() {
            if !segment_ids.insert(record.id.as_str()) {
                return Err(GraphError::DuplicateId(record.id.clone()));
            }
            let lookup = |node: &str| {
                node_index
                    .get(node)
                    .copied()
                    .ok_or_else(|| GraphError::UnknownNode {
                        segment: record.id.clone(),
                        node: node.to_owned(),
                    })
            };
            let (from, to) = (lookup(record.from.as_str())?, lookup(record.to.as_str())?);
            if from == to {
                return Err(GraphError::SelfLoop {
                    segment: record.id.clone(),
                });
            }
            edge_specs.push(EdgeSpec {
                from,
                to,
                heading: heading_of(node_specs[to].position - node_specs[from].position),
                style_class: record.style_class.clone(),
                source,
            });
        }

        let rules = match &document.junctions {
            Some(rules) => rules.clone(),
            None => restore_rules(&document.intersections),
        };
        rules.validate()?;

        let network = Self::from_parts(
            document.name.clone(),
            merge_tolerance,
            rules,
            node_specs,
            edge_specs,
            Vec::new(),
        );
        network.validate()?;

        let node_ids = network.nodes.keys().collect::<Vec<_>>();
        for record in &document.intersections {
            let Some(&index) = node_index.get(record.node_id.as_str()) else {
                log::warn!(
                    "intersection record for unknown node '{}' ignored",
                    record.node_id
                );
                continue;
            };
            let derived = network.intersection_type(node_ids[index]);
            if derived != Some(record.kind) {
                log::warn!(
                    "node '{}' is recorded as {} but classifies as {}",
                    record.node_id,
                    record.kind.as_str(),
                    derived.map_or("unclassified", IntersectionType::as_str)
                );
            }
        }

        log::debug!(
            "imported '{}' with {} nodes and {} segments",
            network.name,
            network.node_count(),
            network.segment_count()
        );
        Ok(network)
    }

    /// Serialises the network to compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_document())?)
    }

    /// Serialises the network to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    /// Parses and validates a network from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: NetworkDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(&document)?)
    }
}

/// Reconstructs junction rules from the radii stored on intersection records.
fn restore_rules(records: &[IntersectionRecord]) -> JunctionRules {
    let mut rules = JunctionRules::default();
    if let Some(record) = records
        .iter()
        .find(|record| record.kind == IntersectionType::Roundabout)
    {
        rules.roundabout_radius = Some(record.radius);
    }
    if let Some(record) = records
        .iter()
        .find(|record| record.kind != IntersectionType::Roundabout)
    {
        rules.intersection_radius = record.radius;
    }
    rules
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use crate::network::{assemble, AssemblyOptions, Assembler};
    use crate::turtle::RoadSegment;

    fn cross() -> RoadNetwork {
        let segments = (0..4)
            .map(|i| {
                let heading = i as f64 * std::f64::consts::FRAC_PI_2;
                RoadSegment {
                    id: i,
                    start: Point2d::new(0.0, 0.0),
                    end: Point2d::new(10.0 * heading.cos(), 10.0 * heading.sin()),
                    heading,
                    style_class: if i % 2 == 0 { "avenue" } else { "local" }.to_owned(),
                }
            })
            .collect::<Vec<_>>();
        assemble(&segments, 0.01).unwrap()
    }

    #[test]
    fn document_uses_sequential_labels() {
        let document = cross().to_document();
        assert_eq!(document.nodes.len(), 5);
        assert_eq!(document.nodes[0].id, "n0");
        assert_eq!(document.segments[3].id, "s3");
        assert_eq!(document.segments[3].from, "n0");
        assert_eq!(document.segments[3].to, "n4");
        assert_eq!(
            document.intersections,
            [IntersectionRecord {
                node_id: "n0".to_owned(),
                kind: IntersectionType::FourWay,
                radius: 2.0,
            }]
        );
    }

    #[test]
    fn json_uses_the_interchange_field_names() {
        let json = cross().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "network");
        assert_eq!(value["intersections"][0]["type"], "4way");
        assert_eq!(value["segments"][1]["style_class"], "local");
        assert_eq!(value["nodes"][1]["position"][0], 10.0);
    }

    #[test]
    fn json_round_trip_preserves_the_graph() {
        let network = cross();
        let restored = RoadNetwork::from_json(&network.to_json_pretty().unwrap()).unwrap();
        assert_eq!(restored.node_count(), network.node_count());
        assert_eq!(restored.segment_count(), network.segment_count());
        assert_eq!(restored.to_document(), network.to_document());
    }

    #[test]
    fn roundabout_radius_is_restored_from_records() {
        let options = AssemblyOptions::default().with_junctions(JunctionRules {
            roundabout_radius: Some(15.0),
            ..Default::default()
        });
        let network = Assembler::new(options)
            .assemble(&cross().to_segments())
            .unwrap();
        let mut document = network.to_document();
        assert_eq!(document.intersections[0].kind, IntersectionType::Roundabout);

        document.junctions = None;
        let restored = RoadNetwork::from_document(&document).unwrap();
        assert_eq!(restored.junction_rules().roundabout_radius, Some(15.0));
        assert_eq!(
            restored.intersections().map(|(_, kind)| kind).collect::<Vec<_>>(),
            [IntersectionType::Roundabout]
        );
    }

    fn document(json: &str) -> NetworkDocument {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn minimal_documents_use_defaults() {
        let network = RoadNetwork::from_document(&document(
            r#"{
                "name": "tiny",
                "nodes": [
                    { "id": "a", "position": [0, 0, 1.5] },
                    { "id": "b", "position": [0, 20, 1.5] }
                ],
                "segments": [ { "id": "ab", "from": "a", "to": "b", "style_class": "local" } ]
            }"#,
        ))
        .unwrap();
        assert_eq!(network.merge_tolerance(), DEFAULT_MERGE_TOLERANCE);
        let node = network.nodes().next().unwrap();
        assert_eq!(node.elevation(), 1.5);
        let edge = network.segments().next().unwrap();
        assert!((edge.heading() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn invalid_documents_are_rejected() {
        let nodes = r#"[
            { "id": "a", "position": [0, 0, 0] },
            { "id": "b", "position": [10, 0, 0] }
        ]"#;
        let with_segments = |segments: &str| {
            document(&format!(
                r#"{{ "name": "bad", "nodes": {}, "segments": {} }}"#,
                nodes, segments
            ))
        };

        assert_eq!(
            RoadNetwork::from_document(&with_segments(
                r#"[{ "id": "s", "from": "a", "to": "c", "style_class": "local" }]"#
            ))
            .unwrap_err(),
            GraphError::UnknownNode {
                segment: "s".to_owned(),
                node: "c".to_owned()
            }
        );
        assert_eq!(
            RoadNetwork::from_document(&with_segments(
                r#"[{ "id": "s", "from": "a", "to": "a", "style_class": "local" }]"#
            ))
            .unwrap_err(),
            GraphError::SelfLoop {
                segment: "s".to_owned()
            }
        );
        assert_eq!(
            RoadNetwork::from_document(&with_segments(
                r#"[
                    { "id": "s", "from": "a", "to": "b", "style_class": "local" },
                    { "id": "s", "from": "b", "to": "a", "style_class": "local" }
                ]"#
            ))
            .unwrap_err(),
            GraphError::DuplicateId("s".to_owned())
        );

        let crowded = document(
            r#"{ "name": "bad", "merge_tolerance": 0.5, "segments": [],
                 "nodes": [ { "id": "a", "position": [0, 0, 0] },
                            { "id": "b", "position": [0.2, 0, 0] } ] }"#,
        );
        assert!(matches!(
            RoadNetwork::from_document(&crowded),
            Err(GraphError::NodesTooClose { .. })
        ));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        assert!(matches!(
            RoadNetwork::from_json("{ \"name\": 3 }"),
            Err(Error::Json(_))
        ));
    }
}
