use super::{rot90, ParametricCurve2d, Point2d, Vector2d};
use crate::util::Interval;
use cgmath::prelude::*;
use itertools::Itertools;

/// Vertices closer together than this are treated as coincident, in m.
const VERTEX_EPSILON: f64 = 1e-9;

/// A piecewise linear path, parameterised by arc length.
#[derive(Clone, Debug, PartialEq)]
pub struct Polyline2d {
    points: Vec<Point2d>,
    /// The arc length at each vertex.
    lengths: Vec<f64>,
}

/// The cross-section direction at a polyline vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MiterFrame {
    /// Unit vector along which lateral offsets are measured.
    pub normal: Vector2d,
    /// Factor applied to lateral offsets so parallel edges keep their width through the joint.
    pub scale: f64,
}

impl Polyline2d {
    /// Creates a polyline, dropping vertices that coincide with their predecessor.
    pub fn new(points: impl IntoIterator<Item = Point2d>) -> Self {
        let mut deduped: Vec<Point2d> = Vec::new();
        for point in points {
            match deduped.last() {
                Some(last) if last.distance(point) < VERTEX_EPSILON => {}
                _ => deduped.push(point),
            }
        }
        let lengths = std::iter::once(0.0)
            .chain(deduped.iter().tuple_windows().scan(0.0, |acc, (a, b)| {
                *acc += a.distance(*b);
                Some(*acc)
            }))
            .collect();
        Self {
            points: deduped,
            lengths,
        }
    }

    /// Creates a straight polyline between two points.
    pub fn line(start: Point2d, end: Point2d) -> Self {
        Self::new([start, end])
    }

    /// The vertices of the polyline.
    pub fn points(&self) -> &[Point2d] {
        &self.points
    }

    /// The total arc length of the polyline.
    pub fn length(&self) -> f64 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    /// Returns true if the polyline has fewer than two distinct vertices.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2
    }

    /// Iterates over the straight pieces of the polyline, yielding
    /// the arc length range and end points of each.
    pub fn pieces(&self) -> impl Iterator<Item = (Interval<f64>, Point2d, Point2d)> + '_ {
        self.points
            .iter()
            .zip(self.lengths.iter())
            .tuple_windows()
            .map(|((a, sa), (b, sb))| (Interval::new(*sa, *sb), *a, *b))
    }

    /// Returns the portion of the polyline between arc lengths `start`
    /// and `length() - end`, or `None` if nothing remains.
    pub fn trimmed(&self, start: f64, end: f64) -> Option<Self> {
        let range = Interval::new(start.max(0.0), self.length() - end.max(0.0));
        if self.is_degenerate() || range.length() <= VERTEX_EPSILON {
            return None;
        }
        let interior = self
            .points
            .iter()
            .zip(self.lengths.iter())
            .filter(|(_, s)| **s > range.min && **s < range.max)
            .map(|(p, _)| *p);
        let points = std::iter::once(self.sample(range.min))
            .chain(interior)
            .chain(std::iter::once(self.sample(range.max)));
        Some(Self::new(points))
    }

    /// Computes the cross-section frame at every vertex.
    ///
    /// Interior vertices are mitred between their adjacent pieces. The ends are mitred
    /// against `start_join` (the tangent of a path arriving at the first vertex) and
    /// `end_join` (the tangent of a path leaving the last vertex) when given, and are
    /// square otherwise. Miter scales are clamped to `miter_limit`, which is never taken
    /// below 1 so that offsets keep their side and width.
    pub fn miter_frames(
        &self,
        start_join: Option<Vector2d>,
        end_join: Option<Vector2d>,
        miter_limit: f64,
    ) -> Vec<MiterFrame> {
        let tangents = self
            .points
            .iter()
            .tuple_windows()
            .map(|(a, b)| (*b - *a).normalize())
            .collect::<Vec<_>>();
        let (Some(first), Some(last)) = (tangents.first(), tangents.last()) else {
            return vec![];
        };

        let mut frames = Vec::with_capacity(self.points.len());
        frames.push(miter(start_join.unwrap_or(*first), *first, miter_limit));
        for (t_in, t_out) in tangents.iter().tuple_windows() {
            frames.push(miter(*t_in, *t_out, miter_limit));
        }
        frames.push(miter(*last, end_join.unwrap_or(*last), miter_limit));
        frames
    }

    /// Offsets every vertex laterally using precomputed frames.
    pub fn offset_points(&self, frames: &[MiterFrame], offset: f64) -> Vec<Point2d> {
        self.points
            .iter()
            .zip(frames)
            .map(|(p, frame)| *p + frame.normal * (offset * frame.scale))
            .collect()
    }

    /// Finds the piece containing arc length `s`.
    fn locate(&self, s: f64) -> usize {
        let pieces = self.points.len().saturating_sub(1).max(1);
        let idx = self.lengths.partition_point(|len| *len <= s);
        idx.saturating_sub(1).min(pieces - 1)
    }
}

/// Computes the mitred frame at a joint between an incoming and outgoing tangent.
fn miter(t_in: Vector2d, t_out: Vector2d, miter_limit: f64) -> MiterFrame {
    let sum = t_in + t_out;
    if sum.magnitude2() < 1e-12 {
        // A full reversal has no miter; fall back to a square joint
        return MiterFrame {
            normal: rot90(t_out),
            scale: 1.0,
        };
    }
    let t = sum.normalize();
    MiterFrame {
        normal: rot90(t),
        scale: (1.0 / t.dot(t_out)).min(miter_limit.max(1.0)),
    }
}

impl ParametricCurve2d for Polyline2d {
    fn sample(&self, t: f64) -> Point2d {
        match self.points.len() {
            0 => Point2d::new(0.0, 0.0),
            1 => self.points[0],
            _ => {
                let idx = self.locate(t);
                let span = Interval::new(self.lengths[idx], self.lengths[idx + 1]);
                let f = ((t - span.min) / span.length()).clamp(0.0, 1.0);
                self.points[idx] + (self.points[idx + 1] - self.points[idx]) * f
            }
        }
    }

    fn bounds(&self) -> Interval<f64> {
        Interval::new(0.0, self.length())
    }

    fn sample_dt(&self, t: f64) -> Vector2d {
        if self.is_degenerate() {
            return Vector2d::new(1.0, 0.0);
        }
        let idx = self.locate(t);
        (self.points[idx + 1] - self.points[idx]).normalize()
    }
}
