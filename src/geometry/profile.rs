use super::style::{LineStyle, StyleProfile};
use serde::{Deserialize, Serialize};

/// The surface type of a strip of the cross-section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BandKind {
    Sidewalk,
    Curb,
    Shoulder,
    Lane,
    Median,
}

impl BandKind {
    /// Returns true for bands raised to the curb height.
    pub fn is_raised(self) -> bool {
        matches!(self, BandKind::Sidewalk | BandKind::Curb)
    }
}

/// A strip of the cross-section between two lateral offsets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
    pub kind: BandKind,
    /// The offset of the left edge; positive is left of the centreline.
    pub left: f64,
    /// The offset of the right edge, always less than `left`.
    pub right: f64,
}

impl Band {
    pub fn width(&self) -> f64 {
        self.left - self.right
    }

    /// The edge of the band furthest from the centreline.
    pub fn outer(&self) -> f64 {
        if self.left.abs() >= self.right.abs() {
            self.left
        } else {
            self.right
        }
    }

    /// The edge of the band nearest the centreline.
    pub fn inner(&self) -> f64 {
        if self.left.abs() >= self.right.abs() {
            self.right
        } else {
            self.left
        }
    }
}

/// What a painted line separates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryRole {
    /// The outer edge of the carriageway, or the side of a median.
    Edge,
    /// Between lanes travelling the same way.
    LaneDivider,
    /// Between opposing directions of travel.
    Centre,
}

/// A painted line at a lateral offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Boundary {
    pub offset: f64,
    pub role: BoundaryRole,
    pub style: LineStyle,
}

/// A road cross-section: bands ordered from the left edge at `+width/2`
/// to the right edge at `-width/2`, and the lines painted between them.
#[derive(Clone, Debug, PartialEq)]
pub struct CrossSection {
    bands: Vec<Band>,
    boundaries: Vec<Boundary>,
    width: f64,
}

impl CrossSection {
    /// Lays out the bands of a profile. Lanes are split evenly between the two
    /// directions around the centre line or median.
    pub fn from_profile(profile: &StyleProfile) -> Self {
        let mut outer = Vec::new();
        if let Some(curb) = &profile.curb {
            if curb.sidewalk_width > 0.0 {
                outer.push((BandKind::Sidewalk, curb.sidewalk_width));
            }
            outer.push((BandKind::Curb, curb.width));
        }
        if let Some(width) = profile.shoulder_width {
            outer.push((BandKind::Shoulder, width));
        }

        let left_lanes = (profile.lane_count / 2) as usize;
        let right_lanes = profile.lane_count as usize - left_lanes;
        let lane = (BandKind::Lane, profile.lane_width);

        let mut layout = outer.clone();
        layout.extend(std::iter::repeat(lane).take(left_lanes));
        if let Some(width) = profile.median_width {
            layout.push((BandKind::Median, width));
        }
        layout.extend(std::iter::repeat(lane).take(right_lanes));
        layout.extend(outer.into_iter().rev());

        let width = layout.iter().map(|(_, w)| w).sum::<f64>();
        let mut left = 0.5 * width;
        let bands = layout
            .into_iter()
            .map(|(kind, w)| {
                let band = Band {
                    kind,
                    left,
                    right: left - w,
                };
                left -= w;
                band
            })
            .collect::<Vec<_>>();

        let markings = &profile.markings;
        let mut boundaries = Vec::new();
        let mut lanes_seen = 0;
        for (i, band) in bands.iter().enumerate() {
            if band.kind != BandKind::Lane {
                continue;
            }
            let after_lane = i > 0 && bands[i - 1].kind == BandKind::Lane;
            let (role, style) = match after_lane {
                false => (BoundaryRole::Edge, markings.edge),
                true if lanes_seen == left_lanes => (BoundaryRole::Centre, markings.centre),
                true => (BoundaryRole::LaneDivider, markings.lane),
            };
            boundaries.push(Boundary {
                offset: band.left,
                role,
                style,
            });
            if bands.get(i + 1).map_or(true, |next| next.kind != BandKind::Lane) {
                boundaries.push(Boundary {
                    offset: band.right,
                    role: BoundaryRole::Edge,
                    style: markings.edge,
                });
            }
            lanes_seen += 1;
        }
        boundaries.retain(|boundary| boundary.style != LineStyle::None);

        Self {
            bands,
            boundaries,
            width,
        }
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// The painted lines, ordered left to right.
    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    /// The full width including curbs and sidewalks, in m.
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn half_width(&self) -> f64 {
        0.5 * self.width
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::style::{CurbProfile, MarkingPattern};
    use assert_approx_eq::assert_approx_eq;

    fn kinds(section: &CrossSection) -> Vec<BandKind> {
        section.bands().iter().map(|band| band.kind).collect()
    }

    #[test]
    fn default_profile_is_two_lanes() {
        let section = CrossSection::from_profile(&StyleProfile::default());
        assert_eq!(kinds(&section), [BandKind::Lane, BandKind::Lane]);
        assert_approx_eq!(section.width(), 7.0);
        assert_approx_eq!(section.bands()[0].left, 3.5);
        assert_approx_eq!(section.bands()[1].right, -3.5);

        let lines = section
            .boundaries()
            .iter()
            .map(|b| (b.offset, b.role, b.style))
            .collect::<Vec<_>>();
        assert_eq!(
            lines,
            [
                (3.5, BoundaryRole::Edge, LineStyle::Solid),
                (0.0, BoundaryRole::Centre, LineStyle::Dashed),
                (-3.5, BoundaryRole::Edge, LineStyle::Solid),
            ]
        );
    }

    #[test]
    fn full_profile_is_mirrored() {
        let profile = StyleProfile {
            lane_count: 4,
            lane_width: 3.0,
            shoulder_width: Some(1.0),
            median_width: Some(2.0),
            curb: Some(CurbProfile {
                width: 0.5,
                sidewalk_width: 1.5,
                ..Default::default()
            }),
            markings: MarkingPattern::default(),
        };
        let section = CrossSection::from_profile(&profile);
        use BandKind::*;
        assert_eq!(
            kinds(&section),
            [Sidewalk, Curb, Shoulder, Lane, Lane, Median, Lane, Lane, Shoulder, Curb, Sidewalk]
        );
        assert_approx_eq!(section.width(), 2.0 * (1.5 + 0.5 + 1.0 + 6.0) + 2.0);
        assert_approx_eq!(section.bands()[5].left, 1.0);
        assert_approx_eq!(section.bands()[5].right, -1.0);
        assert_approx_eq!(section.bands()[0].outer(), section.half_width());
        assert_approx_eq!(section.bands()[10].outer(), -section.half_width());

        let roles = section.boundaries().iter().map(|b| b.role).collect::<Vec<_>>();
        assert_eq!(
            roles,
            [
                BoundaryRole::Edge,
                BoundaryRole::LaneDivider,
                BoundaryRole::Edge,
                BoundaryRole::Edge,
                BoundaryRole::LaneDivider,
                BoundaryRole::Edge,
            ]
        );
        assert_approx_eq!(section.boundaries()[1].offset, 4.0);
    }

    #[test]
    fn hidden_lines_are_dropped() {
        let profile = StyleProfile {
            lane_count: 3,
            markings: MarkingPattern {
                edge: LineStyle::None,
                ..Default::default()
            },
            ..Default::default()
        };
        let section = CrossSection::from_profile(&profile);
        let roles = section.boundaries().iter().map(|b| b.role).collect::<Vec<_>>();
        assert_eq!(roles, [BoundaryRole::Centre, BoundaryRole::LaneDivider]);
        assert_approx_eq!(section.boundaries()[0].offset, 1.75);
    }
}
