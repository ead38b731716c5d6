use crate::error::GraphError;
use crate::math::{angle_between, heading_of, Vector2d};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// The kind of intersection formed at a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntersectionType {
    /// Two segments continuing through the node.
    #[serde(rename = "pass")]
    Pass,
    #[serde(rename = "t3way")]
    T3Way,
    #[serde(rename = "4way")]
    FourWay,
    /// Evenly spaced approaches around a circular island.
    #[serde(rename = "roundabout")]
    Roundabout,
}

impl IntersectionType {
    /// The name used for this type in network documents.
    pub fn as_str(self) -> &'static str {
        match self {
            IntersectionType::Pass => "pass",
            IntersectionType::T3Way => "t3way",
            IntersectionType::FourWay => "4way",
            IntersectionType::Roundabout => "roundabout",
        }
    }

    /// Returns true for types that need a junction patch.
    pub fn is_junction(self) -> bool {
        self != IntersectionType::Pass
    }
}

/// The parameters used to classify and size intersections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JunctionRules {
    /// Distance added to the widest approach half-width to size a junction patch, in m.
    pub intersection_radius: f64,
    /// The radius of the circulating lane centre; roundabouts are only formed when set.
    pub roundabout_radius: Option<f64>,
    /// The fewest approaches a roundabout may have. Never fewer than three.
    pub min_roundabout_degree: usize,
    /// The sharpest bend, in degrees, still treated as a pass-through.
    pub pass_max_bend: f64,
    /// How far, in degrees, each gap between approaches may stray from an even
    /// split before the arrangement stops counting as circular.
    pub circular_tolerance: f64,
}

impl Default for JunctionRules {
    fn default() -> Self {
        Self {
            intersection_radius: 2.0,
            roundabout_radius: None,
            min_roundabout_degree: 4,
            pass_max_bend: 120.0,
            circular_tolerance: 20.0,
        }
    }
}

impl JunctionRules {
    /// Checks that the radii are usable.
    pub fn validate(&self) -> Result<(), GraphError> {
        let radii = std::iter::once(self.intersection_radius).chain(self.roundabout_radius);
        for radius in radii {
            if !radius.is_finite() || radius < 0.0 {
                return Err(GraphError::InvalidRadius(radius));
            }
        }
        Ok(())
    }

    /// Classifies a node from the unit vectors pointing along each incident segment.
    ///
    /// Returns `None` for dead ends and for arrangements no type describes.
    pub fn classify(&self, approaches: &[Vector2d]) -> Option<IntersectionType> {
        let degree = approaches.len();
        if degree < 2 {
            return None;
        }

        if self.roundabout_radius.is_some()
            && degree >= self.min_roundabout_degree.max(3)
            && self.is_circular(approaches)
        {
            return Some(IntersectionType::Roundabout);
        }

        match degree {
            2 => {
                let bend = PI - angle_between(approaches[0], approaches[1]);
                (bend <= self.pass_max_bend.to_radians()).then_some(IntersectionType::Pass)
            }
            3 => Some(IntersectionType::T3Way),
            4 => Some(IntersectionType::FourWay),
            _ => None,
        }
    }

    /// Gets the radius recorded for an intersection of the given type.
    pub fn radius_for(&self, kind: IntersectionType) -> f64 {
        match kind {
            IntersectionType::Roundabout => {
                self.roundabout_radius.unwrap_or(self.intersection_radius)
            }
            _ => self.intersection_radius,
        }
    }

    /// Returns true if the approaches are spread evenly around the node.
    fn is_circular(&self, approaches: &[Vector2d]) -> bool {
        let mut headings = approaches
            .iter()
            .map(|v| heading_of(*v))
            .collect::<Vec<_>>();
        headings.sort_by(f64::total_cmp);

        let even = TAU / headings.len() as f64;
        let tolerance = self.circular_tolerance.to_radians();
        let wrap = headings[0] + TAU - headings[headings.len() - 1];
        headings
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .chain(std::iter::once(wrap))
            .all(|gap| (gap - even).abs() <= tolerance)
    }
}
