//! Small numeric and logging helpers.

use kurbo::{Affine, Point};
use log::debug;
use std::f64::consts::TAU;

pub(crate) const EPSILON: f64 = 1e-6;

/// Whether the value is zero within the format's tolerance.
#[inline]
pub(crate) fn almost_zero(v: f64) -> bool {
    v.abs() <= EPSILON
}

/// Converts a length in micrometers to inches.
#[inline]
pub(crate) fn um2in(micrometers: impl Into<f64>) -> f64 {
    micrometers.into() / 1000.0 / 25.4
}

/// Converts a pixel count to inches at 72 DPI.
#[inline]
pub(crate) fn px2in(px: u32) -> f64 {
    f64::from(px) / 72.0
}

/// Normalizes an angle in radians into `[0, 2π)`.
pub(crate) fn normalize_angle(radians: f64) -> f64 {
    let mut a = radians % TAU;
    if a < 0.0 {
        a += TAU;
    }
    a
}

/// Converts an angle in radians to degrees in `[0, 360)`.
#[inline]
pub(crate) fn rad2deg(radians: f64) -> f64 {
    normalize_angle(radians).to_degrees()
}

/// The point on an axis-aligned ellipse at the given parameter angle.
#[inline]
pub(crate) fn ellipse_point(c: Point, rx: f64, ry: f64, angle: f64) -> Point {
    Point::new(c.x + rx * angle.cos(), c.y + ry * angle.sin())
}

pub(crate) trait PointExt {
    fn rotated(self, angle: f64, center: Point) -> Point;
}

impl PointExt for Point {
    #[inline]
    fn rotated(self, angle: f64, center: Point) -> Point {
        Affine::rotate_about(angle, center) * self
    }
}

pub(crate) trait OptionLog {
    fn debug_none(self, f: impl FnOnce() -> String) -> Self;
}

impl<T> OptionLog for Option<T> {
    #[inline]
    fn debug_none(self, f: impl FnOnce() -> String) -> Self {
        self.or_else(|| {
            debug!("{}", f());

            None
        })
    }
}
