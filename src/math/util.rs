use super::{Point2d, Vector2d};
use cgmath::prelude::*;
use std::f64::consts::TAU;

/// Rotates a vector 90 degrees counter-clockwise, giving the left-hand normal.
pub fn rot90(vec: Vector2d) -> Vector2d {
    Vector2d::new(-vec.y, vec.x)
}

/// Gets the unit vector pointing along `heading`, measured in radians
/// counter-clockwise from the positive x-axis.
pub fn unit_vector(heading: f64) -> Vector2d {
    Vector2d::new(heading.cos(), heading.sin())
}

/// Gets the heading of a vector in radians, normalised to `[0, 2π)`.
pub fn heading_of(vec: Vector2d) -> f64 {
    normalize_angle(vec.y.atan2(vec.x))
}

/// Wraps an angle in radians into `[0, 2π)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let angle = angle.rem_euclid(TAU);
    // `rem_euclid` can round up to exactly TAU for tiny negative inputs
    if angle >= TAU {
        0.0
    } else {
        angle
    }
}

/// Computes the unsigned angle between two vectors, in radians.
pub fn angle_between(a: Vector2d, b: Vector2d) -> f64 {
    let cos = a.dot(b) / (a.magnitude() * b.magnitude());
    cos.clamp(-1.0, 1.0).acos()
}

/// Converts a point to a vertex position in a z-up mesh buffer.
pub fn to_vertex(point: Point2d, z: f64) -> [f32; 3] {
    [point.x as f32, point.y as f32, z as f32]
}
