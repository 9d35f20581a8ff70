use serde::{Deserialize, Serialize};

/// Plane vector / point. Plain arrays keep positions `Copy` and serde-friendly.
pub type Vec2 = [f64; 2];

pub const ZERO: Vec2 = [0.0, 0.0];

#[inline]
pub fn add(a: Vec2, b: Vec2) -> Vec2 {
    [a[0] + b[0], a[1] + b[1]]
}

#[inline]
pub fn sub(a: Vec2, b: Vec2) -> Vec2 {
    [a[0] - b[0], a[1] - b[1]]
}

#[inline]
pub fn scale(v: Vec2, s: f64) -> Vec2 {
    [v[0] * s, v[1] * s]
}

#[inline]
pub fn length_sq(v: Vec2) -> f64 {
    v[0] * v[0] + v[1] * v[1]
}

#[inline]
pub fn length(v: Vec2) -> f64 {
    length_sq(v).sqrt()
}

#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f64 {
    length(sub(a, b))
}

/// Point at fraction `t` of the way from `a` to `b`.
#[inline]
pub fn lerp(a: Vec2, b: Vec2, t: f64) -> Vec2 {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
}

/// Rotate counter-clockwise by `angle` radians.
#[inline]
pub fn rotate(v: Vec2, angle: f64) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    [v[0] * cos - v[1] * sin, v[0] * sin + v[1] * cos]
}

#[inline]
pub fn is_finite(v: Vec2) -> bool {
    v[0].is_finite() && v[1].is_finite()
}

/// A straight line between two points; the unit of output for both the
/// vector-field arrows and the equipotential contours.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Vec2,
    pub end: Vec2,
}

impl LineSegment {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        distance(self.start, self.end)
    }
}
