use crate::math::{Point2d, SpatialGrid, Vector2d};
use cgmath::prelude::*;

/// A union-find forest over point indices.
///
/// The root of every set is its lowest index, so sets are ordered by the first
/// point that joined them.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut idx: usize) -> usize {
        while self.parent[idx] != idx {
            self.parent[idx] = self.parent[self.parent[idx]];
            idx = self.parent[idx];
        }
        idx
    }

    /// Joins the sets containing `a` and `b`, returning false if they were already joined.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[hi] = lo;
        true
    }
}

/// The result of merging nearby points.
#[derive(Clone, Debug)]
pub(crate) struct Clustering {
    /// The cluster index of each input point.
    pub assignment: Vec<usize>,
    /// The mean position of each cluster, ordered by first member.
    pub centroids: Vec<Point2d>,
}

/// Groups points so that any two within `tolerance` of each other share a cluster.
///
/// Proximity is transitive: chains of close points collapse into one cluster.
/// Clusters whose centroids end up within `tolerance` are merged again until no
/// two centroids are that close.
pub(crate) fn cluster_points(points: &[Point2d], tolerance: f64) -> Clustering {
    let mut sets = DisjointSet::new(points.len());

    let mut grid = SpatialGrid::new(tolerance);
    for (i, point) in points.iter().enumerate() {
        let close = grid
            .candidates(*point)
            .filter(|j| points[*j].distance(*point) <= tolerance)
            .collect::<Vec<_>>();
        for j in close {
            sets.union(i, j);
        }
        grid.insert(i, *point);
    }

    let mut passes = 0;
    loop {
        passes += 1;
        let (roots, clustering) = collect(&mut sets, points);

        let mut grid = SpatialGrid::new(tolerance);
        let mut merged = false;
        for (k, centroid) in clustering.centroids.iter().enumerate() {
            let close = grid
                .candidates(*centroid)
                .filter(|j| clustering.centroids[*j].distance(*centroid) <= tolerance)
                .collect::<Vec<_>>();
            for j in close {
                merged |= sets.union(roots[k], roots[j]);
            }
            grid.insert(k, *centroid);
        }

        if !merged {
            log::debug!(
                "merged {} endpoints into {} nodes in {} passes",
                points.len(),
                clustering.centroids.len(),
                passes
            );
            return clustering;
        }
    }
}

/// Numbers the sets by root and computes their centroids.
fn collect(sets: &mut DisjointSet, points: &[Point2d]) -> (Vec<usize>, Clustering) {
    let mut roots = Vec::new();
    let mut cluster_of_root = vec![usize::MAX; points.len()];
    let mut sums: Vec<(Vector2d, usize)> = Vec::new();
    let mut assignment = Vec::with_capacity(points.len());

    for (i, point) in points.iter().enumerate() {
        let root = sets.find(i);
        if cluster_of_root[root] == usize::MAX {
            cluster_of_root[root] = roots.len();
            roots.push(root);
            sums.push((Vector2d::zero(), 0));
        }
        let cluster = cluster_of_root[root];
        sums[cluster].0 += point.to_vec();
        sums[cluster].1 += 1;
        assignment.push(cluster);
    }

    let centroids = sums
        .into_iter()
        .map(|(sum, count)| Point2d::from_vec(sum / count as f64))
        .collect();
    (
        roots,
        Clustering {
            assignment,
            centroids,
        },
    )
}
