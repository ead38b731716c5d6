//! Mathematical structs and functions.

use cgmath::{Point2, Vector2};
pub use curve::{OffsetCurve, ParametricCurve2d};
pub use grid::SpatialGrid;
pub use polyline::{MiterFrame, Polyline2d};
pub use util::*;

mod curve;
mod grid;
mod polyline;
mod util;

/// A 2D point
pub type Point2d = Point2<f64>;

/// A 2D vector
pub type Vector2d = Vector2<f64>;
