use super::profile::{Boundary, BoundaryRole};
use super::style::{LineStyle, MarkingPattern};
use crate::math::{heading_of, to_vertex, OffsetCurve, ParametricCurve2d, Polyline2d};
use crate::util::Interval;
use serde::{Deserialize, Serialize};

/// A painted rectangle, to be drawn as an instanced quad.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkingInstance {
    /// The centre of the rectangle.
    pub position: [f32; 3],
    /// The direction of the long side, in radians counter-clockwise from +x.
    pub heading: f32,
    pub length: f32,
    pub width: f32,
    pub role: BoundaryRole,
}

/// Places the painted rectangles of one boundary line along a centreline.
///
/// Dashes repeat with period `dash_length + gap_length` measured by arc length from
/// the start of `path`, so dash phase carries across vertices.
pub(crate) fn place_markings(
    path: &Polyline2d,
    boundary: &Boundary,
    pattern: &MarkingPattern,
    elevation: impl Fn(f64) -> f64,
    out: &mut Vec<MarkingInstance>,
) {
    let offsets = match boundary.style {
        LineStyle::None => vec![],
        LineStyle::Solid | LineStyle::Dashed => vec![boundary.offset],
        LineStyle::DoubleSolid => vec![
            boundary.offset + pattern.line_width,
            boundary.offset - pattern.line_width,
        ],
    };

    for offset in offsets {
        let line = OffsetCurve::new(path, |_| offset);
        let mut emit = |span: Interval<f64>| {
            let s = span.midpoint();
            out.push(MarkingInstance {
                position: to_vertex(line.sample(s), elevation(s)),
                heading: heading_of(line.sample_dt(s)) as f32,
                length: span.length() as f32,
                width: pattern.line_width as f32,
                role: boundary.role,
            });
        };

        for (piece, _, _) in path.pieces() {
            if boundary.style != LineStyle::Dashed {
                emit(piece);
                continue;
            }
            let period = pattern.dash_length + pattern.gap_length;
            let mut start = (piece.min / period).floor() * period;
            while start < piece.max {
                if let Some(dash) = Interval::new(start, start + pattern.dash_length).intersect(&piece) {
                    emit(dash);
                }
                start += period;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Point2d;
    use assert_approx_eq::assert_approx_eq;

    fn boundary(style: LineStyle) -> Boundary {
        Boundary {
            offset: 1.0,
            role: BoundaryRole::Centre,
            style,
        }
    }

    fn place(path: &Polyline2d, style: LineStyle) -> Vec<MarkingInstance> {
        let mut out = Vec::new();
        place_markings(
            path,
            &boundary(style),
            &MarkingPattern::default(),
            |_| 0.0,
            &mut out,
        );
        out
    }

    #[test]
    fn dashes_fall_on_dash_intervals() {
        let path = Polyline2d::line(Point2d::new(0.0, 0.0), Point2d::new(20.0, 0.0));
        let dashes = place(&path, LineStyle::Dashed);
        // Period 7: [0, 3], [7, 10], [14, 17]
        assert_eq!(dashes.len(), 3);
        let centres = dashes.iter().map(|d| d.position[0]).collect::<Vec<_>>();
        assert_eq!(centres, [1.5, 8.5, 15.5]);
        for dash in &dashes {
            assert_approx_eq!(dash.length, 3.0);
            assert_approx_eq!(dash.position[1], 1.0);
            assert_approx_eq!(dash.heading, 0.0);
            assert_approx_eq!(dash.width, 0.15);
        }
    }

    #[test]
    fn dashes_are_clipped_at_vertices_and_ends() {
        let path = Polyline2d::new([
            Point2d::new(0.0, 0.0),
            Point2d::new(8.5, 0.0),
            Point2d::new(8.5, 10.0),
        ]);
        let dashes = place(&path, LineStyle::Dashed);
        let lengths = dashes.iter().map(|d| d.length).collect::<Vec<_>>();
        // [0, 3] and [7, 8.5] on the first piece, [8.5, 10] and [14, 17] on the second
        assert_eq!(lengths, [3.0, 1.5, 1.5, 3.0]);
        assert_approx_eq!(dashes[2].heading, std::f32::consts::FRAC_PI_2);
        // Left of a northbound line is west
        assert_approx_eq!(dashes[2].position[0], 7.5);
        assert_approx_eq!(dashes[2].position[1], 0.75);
    }

    #[test]
    fn solid_lines_cover_each_piece() {
        let path = Polyline2d::new([
            Point2d::new(0.0, 0.0),
            Point2d::new(5.0, 0.0),
            Point2d::new(5.0, 5.0),
        ]);
        assert_eq!(place(&path, LineStyle::Solid).len(), 2);
        let double = place(&path, LineStyle::DoubleSolid);
        assert_eq!(double.len(), 4);
        assert_approx_eq!(double[0].position[1], 1.15);
        assert_approx_eq!(double[2].position[1], 0.85);
        assert!(place(&path, LineStyle::None).is_empty());
    }
}
