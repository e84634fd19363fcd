use crate::core::math::{approx_equal, Affine2, Vec2, Vec2Ext};

use super::bounds::Aabb;
use super::PhysicsError;

/// Number of line segments used to outline a circle
const CIRCLE_OUTLINE_SEGMENTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Vec2, radius: f64) -> Self {
        Self { center, radius }
    }
}

/// Line segment between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub p1: Vec2,
    pub p2: Vec2,
}

impl Segment {
    pub fn new(p1: Vec2, p2: Vec2) -> Self {
        Self { p1, p2 }
    }

    pub fn direction(&self) -> Vec2 {
        self.p2 - self.p1
    }

    pub fn length(&self) -> f64 {
        self.direction().length()
    }

    pub fn midpoint(&self) -> Vec2 {
        (self.p1 + self.p2) * 0.5
    }

    /// Point of the segment closest to `point`
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        let dir = self.direction();
        let len2 = dir.length_squared();
        if len2 <= f64::EPSILON {
            return self.p1;
        }
        let t = ((point - self.p1).dot(dir) / len2).clamp(0.0, 1.0);
        self.p1 + dir * t
    }
}

/// Rectangle oriented by `angle` around its center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub center: Vec2,
    pub half_extents: Vec2,
    pub angle: f64,
}

impl Rectangle {
    pub fn new(center: Vec2, half_extents: Vec2, angle: f64) -> Self {
        Self {
            center,
            half_extents,
            angle,
        }
    }

    /// Build from full width/height instead of half extents
    pub fn from_size(center: Vec2, size: Vec2, angle: f64) -> Self {
        Self::new(center, size * 0.5, angle)
    }

    /// Unit vectors of the rectangle's own x and y axes
    pub fn axes(&self) -> (Vec2, Vec2) {
        let ux = Vec2::X.rotated(self.angle);
        (ux, ux.perp())
    }

    /// Corners ordered (+x,+y), (+x,-y), (-x,-y), (-x,+y) in the rectangle frame
    pub fn corners(&self) -> [Vec2; 4] {
        let (ux, uy) = self.axes();
        let ex = ux * self.half_extents.x;
        let ey = uy * self.half_extents.y;
        [
            self.center + ex + ey,
            self.center + ex - ey,
            self.center - ex - ey,
            self.center - ex + ey,
        ]
    }

    /// Express a world point in the rectangle frame (origin at the center)
    pub fn to_local(&self, point: Vec2) -> Vec2 {
        let (ux, uy) = self.axes();
        let d = point - self.center;
        Vec2::new(d.dot(ux), d.dot(uy))
    }

    /// Inverse of [`Rectangle::to_local`]
    pub fn from_local(&self, point: Vec2) -> Vec2 {
        let (ux, uy) = self.axes();
        self.center + ux * point.x + uy * point.y
    }

    /// Extent of the rectangle projected on a unit axis, centered on `center · axis`
    pub fn projected_radius(&self, axis: Vec2) -> f64 {
        let (ux, uy) = self.axes();
        self.half_extents.x * ux.dot(axis).abs() + self.half_extents.y * uy.dot(axis).abs()
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        let local = self.to_local(point);
        local.x.abs() <= self.half_extents.x + 1e-12 && local.y.abs() <= self.half_extents.y + 1e-12
    }
}

/// Discriminant of [`Shape`], handy for logging and tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Circle,
    Segment,
    Rectangle,
}

/// Collision primitive.
///
/// Every geometric operation matches exhaustively, so a new variant has to be
/// handled at each call site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Segment(Segment),
    Rectangle(Rectangle),
}

impl Shape {
    pub fn circle(center: Vec2, radius: f64) -> Self {
        Shape::Circle(Circle::new(center, radius))
    }

    pub fn segment(p1: Vec2, p2: Vec2) -> Self {
        Shape::Segment(Segment::new(p1, p2))
    }

    pub fn rectangle(center: Vec2, size: Vec2, angle: f64) -> Self {
        Shape::Rectangle(Rectangle::from_size(center, size, angle))
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Segment(_) => ShapeKind::Segment,
            Shape::Rectangle(_) => ShapeKind::Rectangle,
        }
    }

    /// Axis-aligned bounds of the shape in its current frame
    pub fn bounds(&self) -> Aabb {
        match self {
            Shape::Circle(c) => Aabb::from_center_radius(c.center, c.radius),
            Shape::Segment(s) => Aabb::new(s.p1, s.p2),
            Shape::Rectangle(r) => Aabb::from_points(r.corners()),
        }
    }

    /// Copy of the shape mapped through `transform`; `self` is left untouched
    pub fn transformed(&self, transform: &Affine2) -> Shape {
        match self {
            Shape::Circle(c) => {
                Shape::Circle(Circle {
                    center: transform.transform_point2(c.center),
                    radius: scaled(c.radius, transform.matrix2.determinant().abs().sqrt()),
                })
            }
            Shape::Segment(s) => Shape::Segment(Segment {
                p1: transform.transform_point2(s.p1),
                p2: transform.transform_point2(s.p2),
            }),
            Shape::Rectangle(r) => {
                let (ux, uy) = r.axes();
                let tx = transform.transform_vector2(ux);
                let ty = transform.transform_vector2(uy);
                Shape::Rectangle(Rectangle {
                    center: transform.transform_point2(r.center),
                    half_extents: Vec2::new(
                        scaled(r.half_extents.x, tx.length()),
                        scaled(r.half_extents.y, ty.length()),
                    ),
                    angle: tx.y.atan2(tx.x),
                })
            }
        }
    }

    /// Point used as the shape's position (circle and rectangle center,
    /// segment midpoint)
    pub fn center(&self) -> Vec2 {
        match self {
            Shape::Circle(c) => c.center,
            Shape::Segment(s) => s.midpoint(),
            Shape::Rectangle(r) => r.center,
        }
    }

    /// Move every defining point (circle center, segment endpoints,
    /// rectangle center) through `f`
    pub fn map_points<F: FnMut(Vec2) -> Vec2>(&mut self, mut f: F) {
        match self {
            Shape::Circle(c) => c.center = f(c.center),
            Shape::Segment(s) => {
                s.p1 = f(s.p1);
                s.p2 = f(s.p2);
            }
            Shape::Rectangle(r) => r.center = f(r.center),
        }
    }

    /// Outline as line segments, for debug rendering
    pub fn outline(&self) -> Vec<(Vec2, Vec2)> {
        match self {
            Shape::Circle(c) => (0..CIRCLE_OUTLINE_SEGMENTS)
                .map(|i| {
                    let step = std::f64::consts::TAU / CIRCLE_OUTLINE_SEGMENTS as f64;
                    let a = c.center + Vec2::X.rotated(step * i as f64) * c.radius;
                    let b = c.center + Vec2::X.rotated(step * (i + 1) as f64) * c.radius;
                    (a, b)
                })
                .collect(),
            Shape::Segment(s) => vec![(s.p1, s.p2)],
            Shape::Rectangle(r) => {
                let corners = r.corners();
                (0..4).map(|i| (corners[i], corners[(i + 1) % 4])).collect()
            }
        }
    }

    /// Reject non-finite coordinates and negative sizes
    pub fn validate(&self) -> Result<(), PhysicsError> {
        let finite = |v: Vec2| v.x.is_finite() && v.y.is_finite();
        match self {
            Shape::Circle(c) => {
                if !finite(c.center) || !c.radius.is_finite() || c.radius < 0.0 {
                    return Err(PhysicsError::InvalidShape(format!(
                        "circle at {:?} with radius {}",
                        c.center, c.radius
                    )));
                }
            }
            Shape::Segment(s) => {
                if !finite(s.p1) || !finite(s.p2) {
                    return Err(PhysicsError::InvalidShape(format!(
                        "segment {:?} -> {:?}",
                        s.p1, s.p2
                    )));
                }
            }
            Shape::Rectangle(r) => {
                if !finite(r.center)
                    || !finite(r.half_extents)
                    || r.half_extents.x < 0.0
                    || r.half_extents.y < 0.0
                    || !r.angle.is_finite()
                {
                    return Err(PhysicsError::InvalidShape(format!(
                        "rectangle at {:?} with half extents {:?}",
                        r.center, r.half_extents
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Apply a transform's scale factor, keeping sizes exact under pure rotation
fn scaled(size: f64, scale: f64) -> f64 {
    if approx_equal(scale, 1.0, 1e-12) {
        size
    } else {
        size * scale
    }
}

impl From<Circle> for Shape {
    fn from(c: Circle) -> Self {
        Shape::Circle(c)
    }
}

impl From<Segment> for Shape {
    fn from(s: Segment) -> Self {
        Shape::Segment(s)
    }
}

impl From<Rectangle> for Shape {
    fn from(r: Rectangle) -> Self {
        Shape::Rectangle(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::pose_transform;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_circle_bounds() {
        let b = Shape::circle(Vec2::new(1.0, 2.0), 3.0).bounds();
        assert_eq!(b.min, Vec2::new(-2.0, -1.0));
        assert_eq!(b.max, Vec2::new(4.0, 5.0));
    }

    #[test]
    fn test_segment_bounds() {
        let b = Shape::segment(Vec2::new(3.0, -1.0), Vec2::new(-1.0, 2.0)).bounds();
        assert_eq!(b.min, Vec2::new(-1.0, -1.0));
        assert_eq!(b.max, Vec2::new(3.0, 2.0));
    }

    #[test]
    fn test_rotated_rectangle_bounds() {
        let b = Shape::rectangle(Vec2::ZERO, Vec2::new(4.0, 2.0), FRAC_PI_2).bounds();
        assert_abs_diff_eq!(b.min.x, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(b.max.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rectangle_corner_order() {
        let r = Rectangle::new(Vec2::ZERO, Vec2::new(2.0, 1.0), 0.0);
        let c = r.corners();
        assert_eq!(c[0], Vec2::new(2.0, 1.0));
        assert_eq!(c[1], Vec2::new(2.0, -1.0));
        assert_eq!(c[2], Vec2::new(-2.0, -1.0));
        assert_eq!(c[3], Vec2::new(-2.0, 1.0));
    }

    #[test]
    fn test_transformed_leaves_source_untouched() {
        let local = Shape::circle(Vec2::new(1.0, 0.0), 0.5);
        let world = local.transformed(&pose_transform(Vec2::new(5.0, 5.0), FRAC_PI_2));
        assert_eq!(local, Shape::circle(Vec2::new(1.0, 0.0), 0.5));

        match world {
            Shape::Circle(c) => {
                assert_abs_diff_eq!(c.center.x, 5.0, epsilon = 1e-12);
                assert_abs_diff_eq!(c.center.y, 6.0, epsilon = 1e-12);
                assert_abs_diff_eq!(c.radius, 0.5, epsilon = 1e-12);
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_transformed_rectangle_accumulates_angle() {
        let local = Shape::Rectangle(Rectangle::new(Vec2::new(1.0, 0.0), Vec2::new(1.0, 0.5), 0.25));
        let world = local.transformed(&pose_transform(Vec2::ZERO, 0.5));
        match world {
            Shape::Rectangle(r) => {
                assert_abs_diff_eq!(r.angle, 0.75, epsilon = 1e-12);
                assert_abs_diff_eq!(r.half_extents.x, 1.0, epsilon = 1e-12);
                assert_abs_diff_eq!(r.center.length(), 1.0, epsilon = 1e-12);
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_scaled_circle() {
        let world = Shape::circle(Vec2::ZERO, 1.0).transformed(&Affine2::from_scale(Vec2::splat(2.0)));
        match world {
            Shape::Circle(c) => assert_abs_diff_eq!(c.radius, 2.0, epsilon = 1e-12),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_rectangle_local_roundtrip() {
        let r = Rectangle::new(Vec2::new(3.0, -2.0), Vec2::new(2.0, 1.0), 0.7);
        let p = Vec2::new(4.0, 1.0);
        let back = r.from_local(r.to_local(p));
        assert_abs_diff_eq!(back.x, p.x, epsilon = 1e-12);
        assert_abs_diff_eq!(back.y, p.y, epsilon = 1e-12);
    }

    #[test]
    fn test_closest_point_clamps() {
        let s = Segment::new(Vec2::ZERO, Vec2::new(10.0, 0.0));
        assert_eq!(s.closest_point(Vec2::new(5.0, 3.0)), Vec2::new(5.0, 0.0));
        assert_eq!(s.closest_point(Vec2::new(-5.0, 3.0)), Vec2::ZERO);
        assert_eq!(s.closest_point(Vec2::new(15.0, -3.0)), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_outline_sizes() {
        assert_eq!(Shape::circle(Vec2::ZERO, 1.0).outline().len(), CIRCLE_OUTLINE_SEGMENTS);
        assert_eq!(Shape::segment(Vec2::ZERO, Vec2::X).outline().len(), 1);
        assert_eq!(Shape::rectangle(Vec2::ZERO, Vec2::ONE, 0.0).outline().len(), 4);
    }

    #[test]
    fn test_validate() {
        assert!(Shape::circle(Vec2::ZERO, 1.0).validate().is_ok());
        assert!(Shape::circle(Vec2::ZERO, -1.0).validate().is_err());
        assert!(Shape::segment(Vec2::new(f64::NAN, 0.0), Vec2::X).validate().is_err());
        assert!(Shape::rectangle(Vec2::ZERO, Vec2::new(-1.0, 1.0), 0.0).validate().is_err());
    }
}
