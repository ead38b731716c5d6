use super::mesh::{Mesh, UP};
use crate::math::{to_vertex, unit_vector, Point2d};
use crate::network::IntersectionType;
use crate::NodeId;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// The surface covering an intersection node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JunctionGeometry {
    pub node: NodeId,
    /// The classified type, or `None` for shapes no type describes.
    pub kind: Option<IntersectionType>,
    pub centre: [f32; 3],
    /// The outer radius of the patch in m.
    pub radius: f64,
    /// The radius of the central island of a roundabout.
    pub island_radius: Option<f64>,
    /// The paved surface: a disc, or an annulus around the island.
    pub surface: Mesh,
    /// The raised top of the island, empty when there is none.
    pub island: Mesh,
}

/// Gets `segments` points on a circle, counter-clockwise from +x.
fn ring(centre: Point2d, radius: f64, z: f64, segments: usize) -> Vec<[f32; 3]> {
    (0..segments)
        .map(|i| to_vertex(centre + unit_vector(TAU * i as f64 / segments as f64) * radius, z))
        .collect()
}

/// Builds a flat disc.
pub(crate) fn disc(centre: Point2d, radius: f64, z: f64, segments: usize) -> Mesh {
    let mut mesh = Mesh::new();
    mesh.push_fan(to_vertex(centre, z), &ring(centre, radius, z, segments), UP);
    mesh
}

/// Builds a flat ring between two radii.
pub(crate) fn annulus(centre: Point2d, inner: f64, outer: f64, z: f64, segments: usize) -> Mesh {
    let inner = ring(centre, inner, z, segments);
    let outer = ring(centre, outer, z, segments);
    let mut mesh = Mesh::new();
    for i in 0..segments {
        let j = (i + 1) % segments;
        mesh.push_quad([inner[i], outer[i], outer[j], inner[j]], UP);
    }
    mesh
}

/// The size of a junction patch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PatchShape {
    pub radius: f64,
    /// The island radius for roundabouts; a disc is built when absent.
    pub island: Option<f64>,
}

impl JunctionGeometry {
    /// Builds the patch for a node at `centre`, `z` m above the datum.
    pub(crate) fn new(
        node: NodeId,
        kind: Option<IntersectionType>,
        centre: Point2d,
        z: f64,
        shape: PatchShape,
        island_height: f64,
        segments: usize,
    ) -> Self {
        let (surface, island) = match shape.island {
            Some(island) => (
                annulus(centre, island, shape.radius, z, segments),
                disc(centre, island, z + island_height, segments),
            ),
            None => (disc(centre, shape.radius, z, segments), Mesh::new()),
        };
        Self {
            node,
            kind,
            centre: to_vertex(centre, z),
            radius: shape.radius,
            island_radius: shape.island,
            surface,
            island,
        }
    }
}
