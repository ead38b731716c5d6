//! Tests that move networks through the JSON interchange form.

use road_grammar::{
    build, generate_network, AssemblyOptions, Error, GrammarConfig, GraphError, JunctionRules,
    RoadNetwork, StyleCatalog,
};

fn city() -> RoadNetwork {
    let grammar = GrammarConfig::new("X")
        .with_rules(
            "X -> F[+X]F[-X]+X
             F -> FF",
        )
        .unwrap()
        .with_iterations(3)
        .with_turn_angle(90.0)
        .with_step_length(6.0)
        .with_style_symbol('A', "avenue");
    let options = AssemblyOptions::default()
        .with_name("grid")
        .with_junctions(JunctionRules {
            roundabout_radius: Some(14.0),
            ..Default::default()
        });
    generate_network(&grammar, &options).unwrap()
}

/// Test that exporting and importing preserves connectivity and intersection types.
#[test]
fn round_trip_preserves_the_network() {
    let network = city();
    let json = network.to_json().unwrap();
    let restored = RoadNetwork::from_json(&json).unwrap();

    assert_eq!(restored.name(), "grid");
    assert_eq!(restored.node_count(), network.node_count());
    assert_eq!(restored.segment_count(), network.segment_count());

    let before = network.to_document();
    let after = restored.to_document();
    assert_eq!(before.segments, after.segments);
    assert_eq!(before.intersections, after.intersections);
    assert_eq!(before.nodes, after.nodes);
    assert_eq!(network.summary(), restored.summary());
}

/// Test that geometry can be built from a document written by another tool.
#[test]
fn imported_documents_build_geometry() {
    let json = r#"{
        "name": "crossroads",
        "nodes": [
            { "id": "centre", "position": [0, 0, 0] },
            { "id": "east", "position": [40, 0, 0] },
            { "id": "north", "position": [0, 40, 0] },
            { "id": "west", "position": [-40, 0, 0] },
            { "id": "south", "position": [0, -40, 0] }
        ],
        "segments": [
            { "id": "a", "from": "centre", "to": "east", "style_class": "avenue" },
            { "id": "b", "from": "centre", "to": "north", "style_class": "local" },
            { "id": "c", "from": "west", "to": "centre", "style_class": "avenue" },
            { "id": "d", "from": "south", "to": "centre", "style_class": "local" }
        ],
        "intersections": [
            { "node_id": "centre", "type": "4way", "radius": 3.0 }
        ]
    }"#;
    let network = RoadNetwork::from_json(json).unwrap();
    assert_eq!(network.junction_rules().intersection_radius, 3.0);

    let geometry = build(&network, &StyleCatalog::builtin()).unwrap();
    assert!(geometry.is_complete());
    assert_eq!(geometry.segments.len(), 4);
    assert_eq!(geometry.junctions.len(), 1);

    // The widest approach is the avenue: four 3.5 m lanes, curbs and 3 m sidewalks
    let junction = &geometry.junctions[0];
    assert!((junction.radius - (10.3 + 3.0)).abs() < 1e-9);
    assert!(geometry.marking_count() > 0);
}

/// Test that nodes far from the origin import without trouble.
#[test]
fn distant_nodes_import() {
    let json = r#"{
        "name": "far",
        "nodes": [
            { "id": "a", "position": [1e17, 0, 0] },
            { "id": "b", "position": [0, 0, 0] }
        ],
        "segments": [ { "id": "s", "from": "a", "to": "b", "style_class": "local" } ]
    }"#;
    let network = RoadNetwork::from_json(json).unwrap();
    assert_eq!(network.node_count(), 2);
    assert_eq!(network.segment_count(), 1);
    network.validate().unwrap();
}

/// Test that documents violating the network invariants are refused.
#[test]
fn broken_documents_are_refused() {
    let unknown = r#"{
        "name": "broken",
        "nodes": [ { "id": "a", "position": [0, 0, 0] } ],
        "segments": [ { "id": "s", "from": "a", "to": "b", "style_class": "local" } ]
    }"#;
    assert!(matches!(
        RoadNetwork::from_json(unknown),
        Err(Error::Graph(GraphError::UnknownNode { .. }))
    ));

    let duplicate = r#"{
        "name": "broken",
        "nodes": [
            { "id": "a", "position": [0, 0, 0] },
            { "id": "a", "position": [5, 0, 0] }
        ],
        "segments": []
    }"#;
    assert!(matches!(
        RoadNetwork::from_json(duplicate),
        Err(Error::Graph(GraphError::DuplicateId(id))) if id == "a"
    ));

    let bad_radius = r#"{
        "name": "broken",
        "nodes": [],
        "segments": [],
        "intersections": [ { "node_id": "a", "type": "t3way", "radius": -4.0 } ]
    }"#;
    assert!(matches!(
        RoadNetwork::from_json(bad_radius),
        Err(Error::Graph(GraphError::InvalidRadius(_)))
    ));

    assert!(matches!(
        RoadNetwork::from_json("[]"),
        Err(Error::Json(_))
    ));
}
