use super::{rot90, Point2d, Vector2d};
use crate::util::Interval;
use cgmath::prelude::*;

/// A parametric curve in 2D space.
pub trait ParametricCurve2d {
    /// Samples the parametric curve.
    fn sample(&self, t: f64) -> Point2d;

    /// Returns the minimum and maximum t-values that define the bounds of the curve.
    fn bounds(&self) -> Interval<f64>;

    /// Samples the derivative of the parametric curve.
    ///
    /// The default implementation approximates the derivative by sampling
    /// two very nearby points along the curve.
    fn sample_dt(&self, t: f64) -> Vector2d {
        let delta = self.bounds().length() * 0.0001;
        let p1 = self.sample(t);
        let p2 = self.sample(t + delta);
        (p2 - p1) / delta
    }
}

impl<T: ParametricCurve2d + ?Sized> ParametricCurve2d for &T {
    fn sample(&self, t: f64) -> Point2d {
        (**self).sample(t)
    }

    fn bounds(&self) -> Interval<f64> {
        (**self).bounds()
    }

    fn sample_dt(&self, t: f64) -> Vector2d {
        (**self).sample_dt(t)
    }
}

/// A curve running parallel to another at a lateral distance,
/// positive offsets lying to the left of the direction of travel.
pub struct OffsetCurve<C, F>
where
    C: ParametricCurve2d,
    F: Fn(f64) -> f64,
{
    inner: C,
    offset: F,
}

impl<C, F> OffsetCurve<C, F>
where
    C: ParametricCurve2d,
    F: Fn(f64) -> f64,
{
    pub fn new(curve: C, offset: F) -> Self {
        Self {
            inner: curve,
            offset,
        }
    }
}

impl<C, F> ParametricCurve2d for OffsetCurve<C, F>
where
    C: ParametricCurve2d,
    F: Fn(f64) -> f64,
{
    fn sample(&self, t: f64) -> Point2d {
        let c = self.inner.sample(t);
        let p = rot90(self.inner.sample_dt(t).normalize());
        c + p * (self.offset)(t)
    }

    fn bounds(&self) -> Interval<f64> {
        self.inner.bounds()
    }

    fn sample_dt(&self, t: f64) -> Vector2d {
        self.inner.sample_dt(t)
    }
}
