//! Error and warning types.

use crate::{NodeId, SegmentId};
use thiserror::Error;

/// A malformed grammar or turtle configuration, detected before any work begins.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("axiom must not be empty")]
    EmptyAxiom,

    #[error("grammar has no production rules")]
    NoRules,

    #[error("iteration count must not be negative, got {0}")]
    NegativeIterations(i32),

    #[error("symbol '{symbol}' has an empty production list")]
    EmptyProductions { symbol: char },

    #[error("symbol '{symbol}' has invalid production weight {weight}")]
    InvalidWeight { symbol: char, weight: f64 },

    #[error("step length must be positive and finite, got {0}")]
    InvalidStepLength(f64),

    #[error("turn angle must be finite, got {0}")]
    InvalidTurnAngle(f64),

    #[error("malformed rule on line {line}: {reason}")]
    MalformedRule { line: usize, reason: String },
}

/// An invalid assembly parameter or a violated network invariant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("merge tolerance must be positive and finite, got {0}")]
    InvalidTolerance(f64),

    #[error("junction radius must be non-negative and finite, got {0}")]
    InvalidRadius(f64),

    #[error("duplicate id '{0}'")]
    DuplicateId(String),

    #[error("segment '{segment}' references unknown node '{node}'")]
    UnknownNode { segment: String, node: String },

    #[error("segment '{segment}' starts and ends at the same node")]
    SelfLoop { segment: String },

    #[error("incident segments of node '{node}' do not match the segment list")]
    IncidenceMismatch { node: String },

    #[error("nodes '{a}' and '{b}' are {distance} apart, within the merge tolerance")]
    NodesTooClose { a: String, b: String, distance: f64 },
}

/// A recoverable issue with a single segment or node.
///
/// Warnings are collected on the output of the stage that raised them;
/// the rest of the network is still processed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryWarning {
    #[error("segment {segment} collapsed to a single node and was dropped")]
    DegenerateSegment { segment: usize },

    #[error("segment {segment} duplicates segment {duplicate_of} and was dropped")]
    DuplicateSegment { segment: usize, duplicate_of: usize },

    #[error("no style profile for class '{style_class}' of segment {segment:?}, using the default")]
    MissingStyle {
        segment: SegmentId,
        style_class: String,
    },

    #[error("style profile '{style_class}' of segment {segment:?} is invalid ({reason}), using the default")]
    InvalidStyle {
        segment: SegmentId,
        style_class: String,
        reason: String,
    },

    #[error("segment {segment:?} is shorter than its junction patches and has no surface")]
    SegmentTooShort { segment: SegmentId, length: f64 },

    #[error("node {node:?} with {degree} incident segments has no recognised intersection shape")]
    UnclassifiedJunction { node: NodeId, degree: usize },

    #[error("roundabout at node {node:?} is too small for an island")]
    DegenerateIsland { node: NodeId },
}

/// Any error raised by this crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
