//! Point transforms and per-element transform state
//!
//! ## Rotation Convention
//!
//! Rotation uses the SVG convention: clockwise positive angles, in degrees,
//! with the Y axis pointing down.
//! - 0° = no rotation
//! - 90° = rotated clockwise (right becomes down)
//! - 180° = upside down
//!
//! Displacements answer "where does point P move to under this transform",
//! which is all the propagator needs to keep dependents attached.

use std::fmt;

use crate::layout::types::{Point, Vector};

/// A 2D rotation around a center point.
#[derive(Debug, Clone, Copy)]
pub struct RotationTransform {
    /// Rotation angle in degrees (clockwise positive, per SVG convention)
    pub angle_degrees: f64,
    /// Center point of rotation
    pub center: Point,
}

impl RotationTransform {
    pub fn new(angle_degrees: f64, center: Point) -> Self {
        Self {
            angle_degrees,
            center,
        }
    }

    /// Check if this is effectively a no-op (0° rotation).
    pub fn is_identity(&self) -> bool {
        self.angle_degrees.abs() < f64::EPSILON
    }

    /// Rotate a point around the center.
    ///
    /// In SVG's coordinate system (Y pointing down), clockwise rotation
    /// uses the standard rotation matrix:
    /// ```text
    /// x' = cx + (x - cx) * cos(θ) - (y - cy) * sin(θ)
    /// y' = cy + (x - cx) * sin(θ) + (y - cy) * cos(θ)
    /// ```
    pub fn transform_point(&self, point: Point) -> Point {
        if self.is_identity() {
            return point;
        }

        let radians = self.angle_degrees.to_radians();
        let cos_a = radians.cos();
        let sin_a = radians.sin();

        let dx = point.x - self.center.x;
        let dy = point.y - self.center.y;

        Point {
            x: self.center.x + dx * cos_a - dy * sin_a,
            y: self.center.y + dx * sin_a + dy * cos_a,
        }
    }

    /// How far `point` moves under this rotation
    pub fn displacement(&self, point: Point) -> Vector {
        self.transform_point(point) - point
    }
}

/// A change of scale around a fixed origin, from one scale pair to another.
#[derive(Debug, Clone, Copy)]
pub struct ScaleTransform {
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub origin: Point,
}

impl ScaleTransform {
    pub fn new(from: (f64, f64), to: (f64, f64), origin: Point) -> Self {
        Self { from, to, origin }
    }

    pub fn is_identity(&self) -> bool {
        (self.to.0 - self.from.0).abs() < f64::EPSILON
            && (self.to.1 - self.from.1).abs() < f64::EPSILON
    }

    /// How far `point` moves when the scale changes
    ///
    /// `((px - ox)(s1x - s0x), (py - oy)(s1y - s0y))`
    pub fn displacement(&self, point: Point) -> Vector {
        Vector::new(
            (point.x - self.origin.x) * (self.to.0 - self.from.0),
            (point.y - self.origin.y) * (self.to.1 - self.from.1),
        )
    }
}

/// Committed transform of a single element.
///
/// Only reflects transforms that have been scheduled; in-flight tween progress
/// lives with the tween backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementTransformState {
    pub scale_x: f64,
    pub scale_y: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    /// Degrees, clockwise
    pub rotation: f64,
    pub opacity: f64,
}

impl Default for ElementTransformState {
    fn default() -> Self {
        Self::identity()
    }
}

impl ElementTransformState {
    pub const fn identity() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
            rotation: 0.0,
            opacity: 1.0,
        }
    }

    pub fn translation(&self) -> Vector {
        Vector::new(self.translate_x, self.translate_y)
    }

    pub fn translate_by(&mut self, delta: Vector) {
        self.translate_x += delta.x;
        self.translate_y += delta.y;
    }

    /// Field-wise `other - self`
    pub fn delta_to(&self, other: &ElementTransformState) -> ElementTransformState {
        ElementTransformState {
            scale_x: other.scale_x - self.scale_x,
            scale_y: other.scale_y - self.scale_y,
            translate_x: other.translate_x - self.translate_x,
            translate_y: other.translate_y - self.translate_y,
            rotation: other.rotation - self.rotation,
            opacity: other.opacity - self.opacity,
        }
    }

    /// Field-wise `self + delta * t`
    pub fn add_scaled(&mut self, delta: &ElementTransformState, t: f64) {
        self.scale_x += delta.scale_x * t;
        self.scale_y += delta.scale_y * t;
        self.translate_x += delta.translate_x * t;
        self.translate_y += delta.translate_y * t;
        self.rotation += delta.rotation * t;
        self.opacity += delta.opacity * t;
    }

    /// Zero delta
    pub const fn zero() -> Self {
        Self {
            scale_x: 0.0,
            scale_y: 0.0,
            translate_x: 0.0,
            translate_y: 0.0,
            rotation: 0.0,
            opacity: 0.0,
        }
    }
}

impl fmt::Display for ElementTransformState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translate({:.3}, {:.3}) scale({:.3}, {:.3}) rotate({:.3}) opacity({:.3})",
            self.translate_x,
            self.translate_y,
            self.scale_x,
            self.scale_y,
            self.rotation,
            self.opacity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 0.001;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_identity_rotation() {
        let transform = RotationTransform::new(0.0, Point::new(50.0, 50.0));
        assert!(transform.is_identity());
        let p = Point::new(10.0, 20.0);
        assert_eq!(transform.transform_point(p), p);
    }

    #[test]
    fn test_90_degree_rotation_around_origin() {
        let transform = RotationTransform::new(90.0, Point::origin());
        let result = transform.transform_point(Point::new(1.0, 0.0));
        assert!(approx_eq(result.x, 0.0), "x: expected 0.0, got {}", result.x);
        assert!(approx_eq(result.y, 1.0), "y: expected 1.0, got {}", result.y);
    }

    #[test]
    fn test_rotation_around_non_origin_center() {
        // (100, 50) rotated 90° clockwise about (50, 50) lands at (50, 100)
        let transform = RotationTransform::new(90.0, Point::new(50.0, 50.0));
        let result = transform.transform_point(Point::new(100.0, 50.0));
        assert!(approx_eq(result.x, 50.0), "x: expected 50.0, got {}", result.x);
        assert!(approx_eq(result.y, 100.0), "y: expected 100.0, got {}", result.y);
    }

    #[test]
    fn test_rotation_displacement() {
        let transform = RotationTransform::new(180.0, Point::new(0.0, 0.0));
        let d = transform.displacement(Point::new(10.0, 0.0));
        assert!(approx_eq(d.x, -20.0), "dx: expected -20.0, got {}", d.x);
        assert!(approx_eq(d.y, 0.0), "dy: expected 0.0, got {}", d.y);
    }

    #[test]
    fn test_scale_displacement_about_center() {
        // Box (100, 50, 100, 40) scaled 1 -> 1.2 about its center (150, 70)
        let scale = ScaleTransform::new((1.0, 1.0), (1.2, 1.2), Point::new(150.0, 70.0));
        let top_left = scale.displacement(Point::new(100.0, 50.0));
        assert!(approx_eq(top_left.x, -10.0));
        assert!(approx_eq(top_left.y, -4.0));
        let center_right = scale.displacement(Point::new(200.0, 70.0));
        assert!(approx_eq(center_right.x, 10.0));
        assert!(approx_eq(center_right.y, 0.0));
    }

    #[test]
    fn test_scale_origin_point_is_fixed() {
        let origin = Point::new(12.0, 34.0);
        let scale = ScaleTransform::new((1.0, 2.0), (0.5, 3.0), origin);
        assert_eq!(scale.displacement(origin), Vector::zero());
    }

    #[test]
    fn test_state_delta_and_accumulate() {
        let from = ElementTransformState::identity();
        let mut to = from;
        to.scale_x = 1.5;
        to.translate_by(Vector::new(10.0, -4.0));

        let delta = from.delta_to(&to);
        let mut halfway = from;
        halfway.add_scaled(&delta, 0.5);
        assert!(approx_eq(halfway.scale_x, 1.25));
        assert!(approx_eq(halfway.translate_x, 5.0));
        assert!(approx_eq(halfway.translate_y, -2.0));
        assert!(approx_eq(halfway.opacity, 1.0));
    }
}
