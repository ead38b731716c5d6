//! Road style profiles and the catalogue that resolves style classes to them.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a painted line is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    None,
    Solid,
    Dashed,
    DoubleSolid,
}

/// The painted lines of a road.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkingPattern {
    /// The line between opposing directions of travel.
    pub centre: LineStyle,
    /// The lines between lanes travelling the same way.
    pub lane: LineStyle,
    /// The lines along the outer edges of the carriageway.
    pub edge: LineStyle,
    /// The length of each painted dash in m, no shorter than `line_width`.
    pub dash_length: f64,
    /// The unpainted length between dashes in m, no shorter than `line_width`.
    pub gap_length: f64,
    /// The width of a painted line in m.
    pub line_width: f64,
}

impl Default for MarkingPattern {
    fn default() -> Self {
        Self {
            centre: LineStyle::Dashed,
            lane: LineStyle::Dashed,
            edge: LineStyle::Solid,
            dash_length: 3.0,
            gap_length: 4.0,
            line_width: 0.15,
        }
    }
}

/// A raised curb with an optional sidewalk behind it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurbProfile {
    /// Height of the curb top above the road surface, in m.
    pub height: f64,
    pub width: f64,
    /// Width of the sidewalk behind the curb; zero for none.
    pub sidewalk_width: f64,
}

impl Default for CurbProfile {
    fn default() -> Self {
        Self {
            height: 0.15,
            width: 0.3,
            sidewalk_width: 2.0,
        }
    }
}

/// The cross-section parameters of a road style.
///
/// The default profile has two 3.5 m lanes, a dashed centre line, solid edge
/// lines and no shoulder, median or curb.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleProfile {
    /// The total number of lanes, split between the two directions with the
    /// extra lane of an odd count on the right.
    pub lane_count: u32,
    pub lane_width: f64,
    pub shoulder_width: Option<f64>,
    pub median_width: Option<f64>,
    pub markings: MarkingPattern,
    pub curb: Option<CurbProfile>,
}

impl Default for StyleProfile {
    fn default() -> Self {
        Self {
            lane_count: 2,
            lane_width: 3.5,
            shoulder_width: None,
            median_width: None,
            markings: MarkingPattern::default(),
            curb: None,
        }
    }
}

impl StyleProfile {
    /// Checks that the profile describes a buildable cross-section.
    pub fn validate(&self) -> Result<(), &'static str> {
        fn positive(value: f64) -> bool {
            value.is_finite() && value > 0.0
        }

        if self.lane_count == 0 {
            return Err("a road needs at least one lane");
        }
        if !positive(self.lane_width) {
            return Err("lane width must be positive");
        }
        if !self.shoulder_width.map_or(true, positive) {
            return Err("shoulder width must be positive");
        }
        if !self.median_width.map_or(true, positive) {
            return Err("median width must be positive");
        }

        let markings = &self.markings;
        if !positive(markings.line_width) {
            return Err("line width must be positive");
        }
        let dashed = [markings.centre, markings.lane, markings.edge].contains(&LineStyle::Dashed);
        if dashed && !(positive(markings.dash_length) && positive(markings.gap_length)) {
            return Err("dash and gap lengths must be positive");
        }
        if dashed && markings.dash_length.min(markings.gap_length) < markings.line_width {
            return Err("dash and gap lengths must be at least the line width");
        }

        if let Some(curb) = &self.curb {
            if !positive(curb.width) || !curb.height.is_finite() || curb.height < 0.0 {
                return Err("curb width must be positive and height non-negative");
            }
            if !curb.sidewalk_width.is_finite() || curb.sidewalk_width < 0.0 {
                return Err("sidewalk width must not be negative");
            }
        }
        Ok(())
    }
}

/// Looks up the profile for a style class.
///
/// Returning `None` makes the geometry builder fall back to [StyleProfile::default].
pub trait StyleResolver {
    fn resolve(&self, style_class: &str) -> Option<StyleProfile>;
}

impl<F> StyleResolver for F
where
    F: Fn(&str) -> Option<StyleProfile>,
{
    fn resolve(&self, style_class: &str) -> Option<StyleProfile> {
        self(style_class)
    }
}

/// A named collection of style profiles.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleCatalog {
    profiles: BTreeMap<String, StyleProfile>,
}

static BUILTIN: Lazy<StyleCatalog> = Lazy::new(|| {
    let curb = |sidewalk_width| CurbProfile {
        sidewalk_width,
        ..Default::default()
    };
    StyleCatalog::new()
        .with_profile(
            "local",
            StyleProfile {
                lane_width: 3.0,
                curb: Some(curb(1.5)),
                ..Default::default()
            },
        )
        .with_profile(
            "avenue",
            StyleProfile {
                lane_count: 4,
                markings: MarkingPattern {
                    centre: LineStyle::DoubleSolid,
                    ..Default::default()
                },
                curb: Some(curb(3.0)),
                ..Default::default()
            },
        )
        .with_profile(
            "boulevard",
            StyleProfile {
                lane_count: 4,
                median_width: Some(4.0),
                curb: Some(curb(4.0)),
                ..Default::default()
            },
        )
        .with_profile(
            "highway",
            StyleProfile {
                lane_count: 6,
                lane_width: 3.75,
                shoulder_width: Some(2.5),
                median_width: Some(3.0),
                markings: MarkingPattern {
                    centre: LineStyle::None,
                    gap_length: 9.0,
                    ..Default::default()
                },
                curb: None,
            },
        )
});

impl StyleCatalog {
    /// Creates an empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a catalogue holding the built-in `local`, `avenue`, `boulevard`
    /// and `highway` presets.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Adds or replaces a profile.
    pub fn insert(&mut self, style_class: impl Into<String>, profile: StyleProfile) {
        self.profiles.insert(style_class.into(), profile);
    }

    /// Adds or replaces a profile (builder pattern).
    pub fn with_profile(mut self, style_class: impl Into<String>, profile: StyleProfile) -> Self {
        self.insert(style_class, profile);
        self
    }

    pub fn get(&self, style_class: &str) -> Option<&StyleProfile> {
        self.profiles.get(style_class)
    }

    /// Iterates over the style classes in name order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

impl StyleResolver for StyleCatalog {
    fn resolve(&self, style_class: &str) -> Option<StyleProfile> {
        self.get(style_class).cloned()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builtin_presets_are_valid() {
        let catalog = StyleCatalog::builtin();
        assert_eq!(
            catalog.classes().collect::<Vec<_>>(),
            ["avenue", "boulevard", "highway", "local"]
        );
        for class in catalog.classes() {
            assert_eq!(catalog.get(class).unwrap().validate(), Ok(()), "{}", class);
        }
        assert_eq!(StyleProfile::default().validate(), Ok(()));
    }

    #[test]
    fn invalid_profiles_are_reported() {
        let no_lanes = StyleProfile {
            lane_count: 0,
            ..Default::default()
        };
        assert!(no_lanes.validate().is_err());

        let zero_dash = StyleProfile {
            markings: MarkingPattern {
                dash_length: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(zero_dash.validate().is_err());

        let speckled = StyleProfile {
            markings: MarkingPattern {
                dash_length: 1e-5,
                gap_length: 1e-5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(speckled.validate().is_err());

        let solid_only = StyleProfile {
            markings: MarkingPattern {
                centre: LineStyle::Solid,
                lane: LineStyle::Solid,
                dash_length: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(solid_only.validate(), Ok(()));
    }

    #[test]
    fn catalog_loads_from_json() {
        let catalog: StyleCatalog = serde_json::from_str(
            r#"{
                "lane": { "lane_count": 1, "markings": { "edge": "double_solid" } },
                "track": { "lane_width": 2.5, "curb": { "height": 0.1 } }
            }"#,
        )
        .unwrap();
        let lane = catalog.resolve("lane").unwrap();
        assert_eq!(lane.lane_count, 1);
        assert_eq!(lane.markings.edge, LineStyle::DoubleSolid);
        assert_eq!(lane.markings.dash_length, 3.0);
        let track = catalog.resolve("track").unwrap();
        assert_eq!(track.curb.unwrap().width, 0.3);
        assert!(catalog.resolve("missing").is_none());
    }

    #[test]
    fn closures_resolve_styles() {
        let resolver = |class: &str| (class == "wide").then(|| StyleProfile {
            lane_count: 6,
            ..Default::default()
        });
        assert_eq!(resolver.resolve("wide").unwrap().lane_count, 6);
        assert!(resolver.resolve("narrow").is_none());
    }
}
