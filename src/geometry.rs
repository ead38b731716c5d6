//! The cross-section geometry builder.
//!
//! [GeometryBuilder::build] turns a [RoadNetwork] into plain mesh buffers: a ribbon per
//! cross-section band of every segment, painted marking instances, curb edge lines, and
//! a patch over every intersection. Per-segment problems such as a missing style are
//! recorded as warnings and the rest of the network is still built.

use crate::error::{GeometryWarning, GraphError};
use crate::math::{ParametricCurve2d, Point2d, Polyline2d, Vector2d};
use crate::network::{IntersectionType, RoadEdge, RoadNetwork};
use crate::{NodeId, SegmentId};
use cgmath::prelude::*;
use junction::PatchShape;
use markings::place_markings;
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use sweep::SweepPath;

pub use junction::JunctionGeometry;
pub use markings::MarkingInstance;
pub use mesh::Mesh;
pub use profile::{Band, BandKind, Boundary, BoundaryRole, CrossSection};
pub use style::{
    CurbProfile, LineStyle, MarkingPattern, StyleCatalog, StyleProfile, StyleResolver,
};

mod junction;
mod markings;
mod mesh;
mod profile;
mod style;
mod sweep;

/// Parameters of the geometry builder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// The largest factor by which a mitred joint may widen the cross-section.
    pub miter_limit: f64,
    /// The number of straight sides used to approximate a circle.
    pub arc_segments: usize,
    /// The height of painted markings above the road surface, in m.
    pub marking_lift: f64,
    /// The height of roundabout islands above the road surface, in m.
    pub island_height: f64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            miter_limit: 4.0,
            arc_segments: 32,
            marking_lift: 0.005,
            island_height: 0.15,
        }
    }
}

/// The progress of a [GeometryBuilder].
#[derive(Clone, Debug, PartialEq)]
pub enum BuildState {
    Unbuilt,
    Building,
    /// The last build completed without warnings.
    Built,
    /// The last build completed, but some segments or nodes needed a fallback.
    PartiallyBuilt(Vec<GeometryWarning>),
}

/// The surface of one cross-section band along a segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandSurface {
    pub kind: BandKind,
    pub mesh: Mesh,
}

/// The geometry generated for one road segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentGeometry {
    pub segment: SegmentId,
    pub style_class: String,
    /// The centreline after trimming back from junction patches.
    pub centreline: Vec<[f32; 3]>,
    /// One surface per band, ordered left to right.
    pub surfaces: Vec<BandSurface>,
    pub markings: Vec<MarkingInstance>,
    /// The top outer edge of every curb and sidewalk, ordered left to right.
    pub curb_lines: Vec<Vec<[f32; 3]>>,
}

/// Everything built for a network.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeneratedGeometry {
    pub segments: Vec<SegmentGeometry>,
    pub junctions: Vec<JunctionGeometry>,
    pub warnings: Vec<GeometryWarning>,
}

impl GeneratedGeometry {
    /// Returns true if nothing needed a fallback.
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn segment(&self, id: SegmentId) -> Option<&SegmentGeometry> {
        self.segments.iter().find(|geometry| geometry.segment == id)
    }

    pub fn junction(&self, id: NodeId) -> Option<&JunctionGeometry> {
        self.junctions.iter().find(|geometry| geometry.node == id)
    }

    /// The total number of marking instances.
    pub fn marking_count(&self) -> usize {
        self.segments.iter().map(|s| s.markings.len()).sum()
    }

    /// Merges every road, curb, junction and island surface into one mesh.
    pub fn merged_surface(&self) -> Mesh {
        let mut mesh = Mesh::new();
        for surface in self.segments.iter().flat_map(|s| &s.surfaces) {
            mesh.append(&surface.mesh);
        }
        for junction in &self.junctions {
            mesh.append(&junction.surface);
            mesh.append(&junction.island);
        }
        mesh
    }
}

/// The profile in effect for a segment and its laid-out cross-section.
struct Resolved {
    profile: StyleProfile,
    section: CrossSection,
}

/// A node that gets a junction patch.
struct Patch {
    kind: Option<IntersectionType>,
    shape: PatchShape,
}

/// Builds surface geometry for road networks.
#[derive(Clone, Debug)]
pub struct GeometryBuilder {
    options: BuildOptions,
    state: BuildState,
}

impl Default for GeometryBuilder {
    fn default() -> Self {
        Self::new(BuildOptions::default())
    }
}

impl GeometryBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            state: BuildState::Unbuilt,
        }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// The state left by the last call to [GeometryBuilder::build].
    pub fn state(&self) -> &BuildState {
        &self.state
    }

    /// Builds the geometry of a network, resolving each segment's style class
    /// through `resolver`.
    ///
    /// Only a network that fails [RoadNetwork::validate] is an error, in which
    /// case the builder returns to [BuildState::Unbuilt].
    pub fn build<R>(
        &mut self,
        network: &RoadNetwork,
        resolver: &R,
    ) -> Result<GeneratedGeometry, GraphError>
    where
        R: StyleResolver + ?Sized,
    {
        self.state = BuildState::Building;
        if let Err(err) = network.validate() {
            self.state = BuildState::Unbuilt;
            return Err(err);
        }

        let mut warnings = Vec::new();
        let sections = resolve_sections(network, resolver, &mut warnings);
        let patches = size_patches(network, &sections, &mut warnings);

        let segments = network
            .segments()
            .filter_map(|edge| self.build_segment(network, edge, &sections, &patches, &mut warnings))
            .collect::<Vec<_>>();

        let junctions = patches
            .iter()
            .filter_map(|(id, patch)| {
                let node = network.node(id)?;
                Some(JunctionGeometry::new(
                    id,
                    patch.kind,
                    node.position(),
                    node.elevation(),
                    patch.shape,
                    self.options.island_height,
                    self.options.arc_segments.max(3),
                ))
            })
            .collect::<Vec<_>>();

        for warning in &warnings {
            log::warn!("{}", warning);
        }
        log::debug!(
            "built {} segment surfaces and {} junction patches for '{}'",
            segments.len(),
            junctions.len(),
            network.name()
        );

        self.state = if warnings.is_empty() {
            BuildState::Built
        } else {
            BuildState::PartiallyBuilt(warnings.clone())
        };
        Ok(GeneratedGeometry {
            segments,
            junctions,
            warnings,
        })
    }

    fn build_segment(
        &self,
        network: &RoadNetwork,
        edge: &RoadEdge,
        sections: &SecondaryMap<SegmentId, Resolved>,
        patches: &SecondaryMap<NodeId, Patch>,
        warnings: &mut Vec<GeometryWarning>,
    ) -> Option<SegmentGeometry> {
        let (a, b) = network.segment_endpoints(edge.id())?;
        let from_z = network.node(edge.from())?.elevation();
        let to_z = network.node(edge.to())?.elevation();
        let resolved = sections.get(edge.id())?;

        let trim = |node: NodeId| patches.get(node).map_or(0.0, |patch| patch.shape.radius);
        let Some(path) = Polyline2d::line(a, b).trimmed(trim(edge.from()), trim(edge.to())) else {
            warnings.push(GeometryWarning::SegmentTooShort {
                segment: edge.id(),
                length: a.distance(b),
            });
            return None;
        };

        let start_join = pass_join(network, edge.from(), edge.id()).map(|dir| -dir);
        let end_join = pass_join(network, edge.to(), edge.id());
        let frames = path.miter_frames(start_join, end_join, self.options.miter_limit);

        let along = b - a;
        let elevation_at = |p: Point2d| {
            let t = ((p - a).dot(along) / along.magnitude2()).clamp(0.0, 1.0);
            from_z + (to_z - from_z) * t
        };
        let elevations = path
            .points()
            .iter()
            .map(|p| elevation_at(*p))
            .collect::<Vec<_>>();
        let sweep = SweepPath {
            path: &path,
            frames: &frames,
            elevations: &elevations,
        };

        let curb_height = resolved.profile.curb.as_ref().map_or(0.0, |curb| curb.height);
        let surfaces = resolved
            .section
            .bands()
            .iter()
            .map(|band| {
                let lift = if band.kind.is_raised() { curb_height } else { 0.0 };
                let mut mesh = sweep.ribbon(band, lift);
                if band.kind == BandKind::Curb {
                    mesh.append(&sweep.face(band, curb_height));
                }
                BandSurface {
                    kind: band.kind,
                    mesh,
                }
            })
            .collect();

        let mut markings = Vec::new();
        for boundary in resolved.section.boundaries() {
            place_markings(
                &path,
                boundary,
                &resolved.profile.markings,
                |s| elevation_at(path.sample(s)) + self.options.marking_lift,
                &mut markings,
            );
        }

        let curb_lines = resolved
            .section
            .bands()
            .iter()
            .filter(|band| band.kind.is_raised())
            .map(|band| sweep.edge(band.outer(), curb_height))
            .collect();

        Some(SegmentGeometry {
            segment: edge.id(),
            style_class: edge.style_class().to_owned(),
            centreline: sweep.edge(0.0, 0.0),
            surfaces,
            markings,
            curb_lines,
        })
    }
}

/// Resolves the style of every segment, falling back to the default profile
/// for missing and invalid styles.
fn resolve_sections<R>(
    network: &RoadNetwork,
    resolver: &R,
    warnings: &mut Vec<GeometryWarning>,
) -> SecondaryMap<SegmentId, Resolved>
where
    R: StyleResolver + ?Sized,
{
    let mut sections = SecondaryMap::new();
    for edge in network.segments() {
        let style_class = edge.style_class();
        let profile = match resolver.resolve(style_class) {
            None => {
                warnings.push(GeometryWarning::MissingStyle {
                    segment: edge.id(),
                    style_class: style_class.to_owned(),
                });
                StyleProfile::default()
            }
            Some(profile) => match profile.validate() {
                Ok(()) => profile,
                Err(reason) => {
                    warnings.push(GeometryWarning::InvalidStyle {
                        segment: edge.id(),
                        style_class: style_class.to_owned(),
                        reason: reason.to_owned(),
                    });
                    StyleProfile::default()
                }
            },
        };
        let section = CrossSection::from_profile(&profile);
        sections.insert(edge.id(), Resolved { profile, section });
    }
    sections
}

/// Decides which nodes get a junction patch and how large each one is.
fn size_patches(
    network: &RoadNetwork,
    sections: &SecondaryMap<SegmentId, Resolved>,
    warnings: &mut Vec<GeometryWarning>,
) -> SecondaryMap<NodeId, Patch> {
    let rules = network.junction_rules();
    let mut patches = SecondaryMap::new();
    for node in network.nodes() {
        let kind = network.intersection_type(node.id());
        let needs_patch = match kind {
            Some(kind) => kind.is_junction(),
            None => node.degree() >= 2,
        };
        if !needs_patch {
            continue;
        }
        if kind.is_none() {
            warnings.push(GeometryWarning::UnclassifiedJunction {
                node: node.id(),
                degree: node.degree(),
            });
        }

        let half_width = node
            .incident()
            .iter()
            .filter_map(|segment| sections.get(*segment))
            .map(|resolved| resolved.section.half_width())
            .fold(0.0, f64::max);
        let default_shape = PatchShape {
            radius: half_width + rules.intersection_radius,
            island: None,
        };
        let shape = match (kind, rules.roundabout_radius) {
            (Some(IntersectionType::Roundabout), Some(radius)) => {
                let island = radius - half_width;
                if island <= 0.0 {
                    warnings.push(GeometryWarning::DegenerateIsland { node: node.id() });
                }
                PatchShape {
                    radius: radius + half_width,
                    island: (island > 0.0).then_some(island),
                }
            }
            _ => default_shape,
        };
        patches.insert(node.id(), Patch { kind, shape });
    }
    patches
}

/// Gets the direction from a pass-through node along its other segment, used to
/// mitre the end of `segment` against its neighbour.
fn pass_join(network: &RoadNetwork, node: NodeId, segment: SegmentId) -> Option<Vector2d> {
    if network.intersection_type(node) != Some(IntersectionType::Pass) {
        return None;
    }
    let other = network
        .node(node)?
        .incident()
        .iter()
        .find(|id| **id != segment)?;
    network.approach(node, *other)
}

/// Builds the geometry of a network with default options.
pub fn build<R>(network: &RoadNetwork, resolver: &R) -> Result<GeneratedGeometry, GraphError>
where
    R: StyleResolver + ?Sized,
{
    GeometryBuilder::default().build(network, resolver)
}
