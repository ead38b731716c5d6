use super::Point2d;
use itertools::iproduct;
use smallvec::SmallVec;
use std::collections::HashMap;

/// The largest cell coordinate, one short of `i64::MAX`.
const CELL_LIMIT: i64 = i64::MAX - 1;

/// A uniform grid of buckets for finding nearby points.
///
/// With a cell size equal to the search radius, every point within that
/// radius of a query lies in the 3x3 block of cells around it.
pub struct SpatialGrid {
    inv_cell_size: f64,
    cells: HashMap<(i64, i64), SmallVec<[usize; 4]>>,
}

impl SpatialGrid {
    /// Creates an empty grid; `cell_size` must be positive.
    pub fn new(cell_size: f64) -> Self {
        Self {
            inv_cell_size: 1.0 / cell_size,
            cells: HashMap::new(),
        }
    }

    /// Adds the point with the given index to the grid.
    pub fn insert(&mut self, index: usize, point: Point2d) {
        self.cells.entry(self.cell_of(point)).or_default().push(index);
    }

    /// Returns the indices of all inserted points that may lie within one cell
    /// size of `point`, in insertion order per cell.
    pub fn candidates(&self, point: Point2d) -> impl Iterator<Item = usize> + '_ {
        let (cx, cy) = self.cell_of(point);
        iproduct!(-1..=1, -1..=1)
            .filter_map(move |(dx, dy)| self.cells.get(&(cx + dx, cy + dy)))
            .flat_map(|bucket| bucket.iter().copied())
    }

    /// Far-off points share the outermost cells, which leave room for a neighbour.
    fn cell_of(&self, point: Point2d) -> (i64, i64) {
        let index = |v: f64| {
            let cell = (v * self.inv_cell_size).floor() as i64;
            cell.clamp(-CELL_LIMIT, CELL_LIMIT)
        };
        (index(point.x), index(point.y))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use cgmath::MetricSpace;
    use rand::{Rng, SeedableRng};

    #[test]
    fn candidates_cover_every_point_within_a_cell() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"Every road leads somewhere else.");
        let points = (0..500)
            .map(|_| Point2d::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0)))
            .collect::<Vec<_>>();
        let mut grid = SpatialGrid::new(2.0);
        for (i, p) in points.iter().enumerate() {
            grid.insert(i, *p);
        }
        for query in &points {
            let found = grid.candidates(*query).collect::<Vec<_>>();
            for (i, p) in points.iter().enumerate() {
                if p.distance(*query) <= 2.0 {
                    assert!(found.contains(&i));
                }
            }
        }
    }

    #[test]
    fn far_points_with_tiny_cells_are_found() {
        let points = [
            Point2d::new(0.0, 0.0),
            Point2d::new(1e17, -1e17),
            Point2d::new(1e17 + 1.0, -1e17),
            Point2d::new(-1e17, 1e17),
        ];
        let mut grid = SpatialGrid::new(1e-15);
        for (i, p) in points.iter().enumerate() {
            grid.insert(i, *p);
        }
        assert_eq!(grid.candidates(points[0]).collect::<Vec<_>>(), [0]);
        assert_eq!(grid.candidates(points[1]).collect::<Vec<_>>(), [1, 2]);
        assert_eq!(grid.candidates(points[3]).collect::<Vec<_>>(), [3]);
    }
}
