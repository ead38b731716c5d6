use super::mesh::{Mesh, UP};
use super::profile::Band;
use crate::math::{rot90, to_vertex, MiterFrame, Polyline2d};
use cgmath::prelude::*;

/// A centreline prepared for sweeping: its mitred frames and the ground
/// elevation at each vertex.
pub(crate) struct SweepPath<'a> {
    pub path: &'a Polyline2d,
    pub frames: &'a [MiterFrame],
    pub elevations: &'a [f64],
}

impl SweepPath<'_> {
    /// Offsets the centreline laterally and lifts it above the ground.
    pub fn edge(&self, offset: f64, lift: f64) -> Vec<[f32; 3]> {
        self.path
            .offset_points(self.frames, offset)
            .into_iter()
            .zip(self.elevations)
            .map(|(p, z)| to_vertex(p, z + lift))
            .collect()
    }

    /// Builds the flat ribbon covering one band.
    pub fn ribbon(&self, band: &Band, lift: f64) -> Mesh {
        let left = self.edge(band.left, lift);
        let right = self.edge(band.right, lift);
        let mut mesh = Mesh::new();
        for i in 1..left.len() {
            mesh.push_quad([left[i - 1], right[i - 1], right[i], left[i]], UP);
        }
        mesh
    }

    /// Builds the vertical face on the carriageway side of a raised band,
    /// facing the centreline.
    pub fn face(&self, band: &Band, height: f64) -> Mesh {
        let inner = band.inner();
        let bottom = self.edge(inner, 0.0);
        let top = self.edge(inner, height);
        let points = self.path.points();
        let facing = if inner >= 0.0 { -1.0 } else { 1.0 };

        let mut mesh = Mesh::new();
        for i in 1..bottom.len() {
            let dir = (points[i] - points[i - 1]).normalize();
            let n = rot90(dir) * facing;
            let normal = [n.x as f32, n.y as f32, 0.0];
            let corners = if inner >= 0.0 {
                [bottom[i - 1], bottom[i], top[i], top[i - 1]]
            } else {
                [bottom[i], bottom[i - 1], top[i - 1], top[i]]
            };
            mesh.push_quad(corners, normal);
        }
        mesh
    }
}
