use serde::{Deserialize, Serialize};

/// The normal of a flat, upward facing surface.
pub const UP: [f32; 3] = [0.0, 0.0, 1.0];

/// An indexed triangle mesh in plain buffers, z-up, counter-clockwise winding.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Adds a quad from four corners given in counter-clockwise order.
    pub fn push_quad(&mut self, corners: [[f32; 3]; 4], normal: [f32; 3]) {
        let vi = self.positions.len() as u32;
        self.positions.extend_from_slice(&corners);
        self.normals.extend_from_slice(&[normal; 4]);
        self.indices
            .extend_from_slice(&[vi, vi + 1, vi + 2, vi, vi + 2, vi + 3]);
    }

    /// Adds a triangle fan around `centre` through `rim`, closing the loop.
    /// The rim must run counter-clockwise.
    pub fn push_fan(&mut self, centre: [f32; 3], rim: &[[f32; 3]], normal: [f32; 3]) {
        if rim.len() < 3 {
            return;
        }
        let vi = self.positions.len() as u32;
        self.positions.push(centre);
        self.positions.extend_from_slice(rim);
        self.normals
            .extend(std::iter::repeat(normal).take(rim.len() + 1));
        let n = rim.len() as u32;
        for i in 0..n {
            self.indices
                .extend_from_slice(&[vi, vi + 1 + i, vi + 1 + (i + 1) % n]);
        }
    }

    /// Appends another mesh, offsetting its indices.
    pub fn append(&mut self, other: &Mesh) {
        let vi = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices.extend(other.indices.iter().map(|i| i + vi));
    }

    /// Computes the signed area of every triangle projected onto the xy plane.
    pub fn projected_areas(&self) -> impl Iterator<Item = f64> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            let [a, b, c] = [0, 1, 2].map(|k| self.positions[tri[k] as usize]);
            let (abx, aby) = ((b[0] - a[0]) as f64, (b[1] - a[1]) as f64);
            let (acx, acy) = ((c[0] - a[0]) as f64, (c[1] - a[1]) as f64);
            0.5 * (abx * acy - aby * acx)
        })
    }
}
