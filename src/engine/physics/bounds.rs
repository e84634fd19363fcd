use std::ops::{Add, AddAssign};

use crate::core::math::{lerp, Vec2};

/// Axis-aligned bounding box.
///
/// [`Aabb::EMPTY`] is the identity for union: it has no extent, overlaps
/// nothing and contains no point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Box with no extent
    pub const EMPTY: Aabb = Aabb {
        min: Vec2::splat(f64::INFINITY),
        max: Vec2::splat(f64::NEG_INFINITY),
    };

    /// Create a box from two corners in any order
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Square box centered on `center`
    pub fn from_center_radius(center: Vec2, radius: f64) -> Self {
        let r = Vec2::splat(radius.abs());
        Self {
            min: center - r,
            max: center + r,
        }
    }

    /// Smallest box enclosing every point
    pub fn from_points<I: IntoIterator<Item = Vec2>>(points: I) -> Self {
        points
            .into_iter()
            .fold(Self::EMPTY, |acc, p| acc + Self { min: p, max: p })
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max.x - self.min.x
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max.y - self.min.y
        }
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Closed-interval overlap test; touching boxes overlap
    pub fn intersects(&self, other: &Aabb) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Overlapping region, [`Aabb::EMPTY`] if disjoint
    pub fn intersection(&self, other: &Aabb) -> Aabb {
        if !self.intersects(other) {
            return Aabb::EMPTY;
        }
        Aabb {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    /// Fraction of this box covered by `other`, in [0, 1].
    ///
    /// Degenerate (zero-area) boxes count as fully covered when touched.
    pub fn coverage(&self, other: &Aabb) -> f64 {
        let area = self.area();
        if !self.intersects(other) {
            return 0.0;
        }
        if area <= 0.0 {
            return 1.0;
        }
        (self.intersection(other).area() / area).clamp(0.0, 1.0)
    }

    /// Split in two halves: across x when `vertical`, across y otherwise
    pub fn halves(&self, vertical: bool) -> (Aabb, Aabb) {
        if vertical {
            let mid = lerp(self.min.x, self.max.x, 0.5);
            (
                Aabb::new(self.min, Vec2::new(mid, self.max.y)),
                Aabb::new(Vec2::new(mid, self.min.y), self.max),
            )
        } else {
            let mid = lerp(self.min.y, self.max.y, 0.5);
            (
                Aabb::new(self.min, Vec2::new(self.max.x, mid)),
                Aabb::new(Vec2::new(self.min.x, mid), self.max),
            )
        }
    }

    /// The four edges as line segments, counter-clockwise from the min corner
    pub fn edges(&self) -> [(Vec2, Vec2); 4] {
        let a = self.min;
        let b = Vec2::new(self.max.x, self.min.y);
        let c = self.max;
        let d = Vec2::new(self.min.x, self.max.y);
        [(a, b), (b, c), (c, d), (d, a)]
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Add for Aabb {
    type Output = Aabb;

    fn add(self, other: Aabb) -> Aabb {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

impl AddAssign for Aabb {
    fn add_assign(&mut self, other: Aabb) {
        *self = *self + other;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn boxed(x0: f64, y0: f64, x1: f64, y1: f64) -> Aabb {
        Aabb::new(Vec2::new(x0, y0), Vec2::new(x1, y1))
    }

    #[test]
    fn test_empty_is_union_identity() {
        let b = boxed(0.0, 0.0, 2.0, 3.0);
        assert_eq!(Aabb::EMPTY + b, b);
        assert_eq!(b + Aabb::EMPTY, b);

        let mut acc = Aabb::EMPTY;
        acc += b;
        assert_eq!(acc, b);
        assert!((Aabb::EMPTY + Aabb::EMPTY).is_empty());
    }

    #[test]
    fn test_union() {
        let u = boxed(0.0, 0.0, 1.0, 1.0) + boxed(2.0, -1.0, 3.0, 0.5);
        assert_eq!(u, boxed(0.0, -1.0, 3.0, 1.0));
    }

    #[test]
    fn test_intersects_closed_intervals() {
        let a = boxed(0.0, 0.0, 1.0, 1.0);
        assert!(a.intersects(&boxed(1.0, 0.5, 2.0, 2.0)), "touching boxes overlap");
        assert!(!a.intersects(&boxed(1.1, 0.0, 2.0, 1.0)));
        assert!(!a.intersects(&Aabb::EMPTY));
        assert!(!Aabb::EMPTY.intersects(&Aabb::EMPTY));
    }

    #[test]
    fn test_contains_point() {
        let a = boxed(0.0, 0.0, 1.0, 1.0);
        assert!(a.contains_point(Vec2::new(0.5, 1.0)));
        assert!(!a.contains_point(Vec2::new(1.5, 0.5)));
        assert!(!Aabb::EMPTY.contains_point(Vec2::ZERO));
    }

    #[test]
    fn test_from_points() {
        let b = Aabb::from_points([Vec2::new(1.0, 5.0), Vec2::new(-2.0, 0.0), Vec2::new(0.0, 2.0)]);
        assert_eq!(b, boxed(-2.0, 0.0, 1.0, 5.0));
        assert!(Aabb::from_points(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_coverage() {
        let node = boxed(0.0, 0.0, 10.0, 10.0);
        assert_relative_eq!(node.coverage(&boxed(0.0, 0.0, 5.0, 10.0)), 0.5);
        assert_relative_eq!(node.coverage(&boxed(-5.0, -5.0, 20.0, 20.0)), 1.0);
        assert_eq!(node.coverage(&boxed(11.0, 11.0, 12.0, 12.0)), 0.0);
    }

    #[test]
    fn test_halves() {
        let b = boxed(0.0, 0.0, 4.0, 2.0);
        let (left, right) = b.halves(true);
        assert_eq!(left, boxed(0.0, 0.0, 2.0, 2.0));
        assert_eq!(right, boxed(2.0, 0.0, 4.0, 2.0));

        let (bottom, top) = b.halves(false);
        assert_eq!(bottom, boxed(0.0, 0.0, 4.0, 1.0));
        assert_eq!(top, boxed(0.0, 1.0, 4.0, 2.0));
    }

    #[test]
    fn test_edges_close_the_loop() {
        let edges = boxed(0.0, 0.0, 1.0, 2.0).edges();
        for i in 0..4 {
            assert_eq!(edges[i].1, edges[(i + 1) % 4].0);
        }
    }
}
