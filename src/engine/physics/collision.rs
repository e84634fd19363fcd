//! Narrow phase: exact contact geometry for every pair of shape kinds.
//!
//! Normals follow one convention everywhere: `normal1` points from the first
//! shape toward the second, `normal2` is its negation. Pushing the first shape
//! along `-normal1` and the second along `-normal2` by `depth` in total
//! separates them.

use std::cmp::Ordering;

use crate::core::math::{Vec2, Vec2Ext, EPSILON};

use super::handle::ObjectHandle;
use super::shape::{Circle, Rectangle, Segment, Shape};

/// Contact between two primitives
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Contact point in world space
    pub position: Vec2,
    /// Unit normal from the first primitive toward the second
    pub normal1: Vec2,
    /// Unit normal from the second primitive toward the first
    pub normal2: Vec2,
    /// Penetration depth, never negative
    pub depth: f64,
}

impl Contact {
    pub fn new(position: Vec2, normal1: Vec2, depth: f64) -> Self {
        Self {
            position,
            normal1,
            normal2: -normal1,
            depth: depth.max(0.0),
        }
    }

    /// Same contact seen from the other primitive
    pub fn swapped(self) -> Self {
        Self {
            normal1: self.normal2,
            normal2: self.normal1,
            ..self
        }
    }
}

/// All primitive contacts between one pair of objects, averaged
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergedContact {
    pub object1: ObjectHandle,
    pub object2: ObjectHandle,
    pub position: Vec2,
    pub normal1: Vec2,
    pub normal2: Vec2,
    pub depth: f64,
    /// Number of primitive contacts merged into this one
    pub count: usize,
}

impl MergedContact {
    /// Arithmetic mean of `contacts`, `None` when there are none
    pub fn from_contacts(object1: ObjectHandle, object2: ObjectHandle, contacts: &[Contact]) -> Option<Self> {
        if contacts.is_empty() {
            return None;
        }
        let n = contacts.len() as f64;
        let (position, normal1, normal2, depth) = contacts.iter().fold(
            (Vec2::ZERO, Vec2::ZERO, Vec2::ZERO, 0.0),
            |(p, n1, n2, d), c| (p + c.position, n1 + c.normal1, n2 + c.normal2, d + c.depth),
        );
        Some(Self {
            object1,
            object2,
            position: position / n,
            normal1: normal1 / n,
            normal2: normal2 / n,
            depth: depth / n,
            count: contacts.len(),
        })
    }
}

/// Narrow-phase test for any two shapes.
///
/// Mixed pairs are computed by one direction and swapped for the other;
/// same-kind pairs are evaluated in a canonical operand order, so
/// `test(a, b)` always equals `test(b, a)` with the normals exchanged.
pub fn test(a: &Shape, b: &Shape) -> Option<Contact> {
    match (a, b) {
        (Shape::Circle(c1), Shape::Circle(c2)) => {
            canonical(c1, c2, |c| [c.center.x, c.center.y, c.radius], circle_circle)
        }
        (Shape::Circle(c), Shape::Segment(s)) => circle_segment(c, s),
        (Shape::Circle(c), Shape::Rectangle(r)) => circle_rectangle(c, r),

        (Shape::Segment(s), Shape::Circle(c)) => circle_segment(c, s).map(Contact::swapped),
        (Shape::Segment(s1), Shape::Segment(s2)) => {
            canonical(s1, s2, |s| [s.p1.x, s.p1.y, s.p2.x, s.p2.y], segment_segment)
        }
        (Shape::Segment(s), Shape::Rectangle(r)) => segment_rectangle(s, r),

        (Shape::Rectangle(r), Shape::Circle(c)) => circle_rectangle(c, r).map(Contact::swapped),
        (Shape::Rectangle(r), Shape::Segment(s)) => segment_rectangle(s, r).map(Contact::swapped),
        (Shape::Rectangle(r1), Shape::Rectangle(r2)) => canonical(
            r1,
            r2,
            |r| [r.center.x, r.center.y, r.half_extents.x, r.half_extents.y, r.angle],
            rectangle_rectangle,
        ),
    }
}

/// Run `f` with the operands in lexicographic key order
fn canonical<T, const N: usize>(
    a: &T,
    b: &T,
    key: impl Fn(&T) -> [f64; N],
    f: impl Fn(&T, &T) -> Option<Contact>,
) -> Option<Contact> {
    let order = key(a)
        .iter()
        .zip(key(b).iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal);

    if order == Ordering::Greater {
        f(b, a).map(Contact::swapped)
    } else {
        f(a, b)
    }
}

fn circle_circle(c1: &Circle, c2: &Circle) -> Option<Contact> {
    let delta = c2.center - c1.center;
    let distance = delta.length();
    let reach = c1.radius + c2.radius;
    if distance > reach {
        return None;
    }

    let normal = delta.try_unit().unwrap_or(Vec2::X);
    let position = if reach > 0.0 {
        c1.center + delta * (c1.radius / reach)
    } else {
        c1.center
    };
    Some(Contact::new(position, normal, reach - distance))
}

/// Circle against a single point (segment caps, degenerate segments)
fn circle_point(c: &Circle, point: Vec2) -> Option<Contact> {
    let offset = point - c.center;
    let distance = offset.length();
    if distance > c.radius {
        return None;
    }
    let normal = offset.try_unit().unwrap_or(Vec2::X);
    Some(Contact::new(point, normal, c.radius - distance))
}

fn circle_segment(c: &Circle, s: &Segment) -> Option<Contact> {
    let dir = s.direction();
    let length = dir.length();
    if length <= EPSILON {
        return circle_point(c, s.p1);
    }

    let unit = dir / length;
    let projection = (c.center - s.p1).dot(unit);
    if projection < 0.0 {
        return circle_point(c, s.p1);
    }
    if projection > length {
        return circle_point(c, s.p2);
    }

    let closest = s.p1 + unit * projection;
    let offset = closest - c.center;
    let distance = offset.length();
    if distance > c.radius {
        return None;
    }
    // center exactly on the segment: push along the segment's normal
    let normal = offset.try_unit().unwrap_or(-unit.perp());
    Some(Contact::new(closest, normal, c.radius - distance))
}

/// -1 below `-half`, 1 above `half`, 0 within (boundary included)
fn classify(value: f64, half: f64) -> i8 {
    if value < -half {
        -1
    } else if value > half {
        1
    } else {
        0
    }
}

fn circle_rectangle(c: &Circle, r: &Rectangle) -> Option<Contact> {
    let (ux, uy) = r.axes();
    let to_world = |v: Vec2| ux * v.x + uy * v.y;
    let local = r.to_local(c.center);
    let half = r.half_extents;

    match (classify(local.x, half.x), classify(local.y, half.y)) {
        (0, 0) => {
            // center inside or on the boundary: leave through the nearest face
            let face_x = half.x - local.x.abs();
            let face_y = half.y - local.y.abs();
            let sign = |v: f64| if v >= 0.0 { 1.0 } else { -1.0 };
            let (boundary, outward, face) = if face_x <= face_y {
                let sx = sign(local.x);
                (Vec2::new(sx * half.x, local.y), Vec2::new(sx, 0.0), face_x)
            } else {
                let sy = sign(local.y);
                (Vec2::new(local.x, sy * half.y), Vec2::new(0.0, sy), face_y)
            };
            Some(Contact::new(
                r.from_local(boundary),
                -to_world(outward),
                face + c.radius,
            ))
        }
        _ => {
            // edge regions clamp one coordinate, corner regions clamp both
            let closest = local.clamp(-half, half);
            let offset = local - closest;
            let distance = offset.length();
            if distance > c.radius {
                return None;
            }
            let outward = offset.try_unit().unwrap_or(Vec2::X);
            Some(Contact::new(
                r.from_local(closest),
                -to_world(outward),
                c.radius - distance,
            ))
        }
    }
}

fn segment_segment(a: &Segment, b: &Segment) -> Option<Contact> {
    let d1 = a.direction();
    let d2 = b.direction();
    let r = b.p1 - a.p1;

    // tolerances are relative to the segment lengths
    let parallel = EPSILON * d1.length() * d2.length();
    let mut denom = d1.det(d2);
    if denom.abs() <= parallel {
        if r.det(d1).abs() <= EPSILON * r.length() * d1.length() {
            // collinear or degenerate: no crossing point to report
            return None;
        }
        denom = parallel.copysign(denom);
    }

    let t = r.det(d2) / denom;
    let u = r.det(d1) / denom;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }

    let point = a.p1 + d1 * t;
    let normal_a = d1.try_unit()?.perp();
    let normal_b = d2.try_unit()?.perp();

    let (depth_a, side_a) = overshoot(a, normal_b, point);
    let (depth_b, side_b) = overshoot(b, normal_a, point);
    if depth_a <= depth_b {
        Some(Contact::new(point, normal_b * side_a, depth_a))
    } else {
        Some(Contact::new(point, -normal_a * side_b, depth_b))
    }
}

/// How far `s` reaches across the line through `point` with unit `normal`,
/// measured at its shorter end, and the side that end lies on
fn overshoot(s: &Segment, normal: Vec2, point: Vec2) -> (f64, f64) {
    let side = |v: f64| if v >= 0.0 { 1.0 } else { -1.0 };
    let d1 = normal.dot(s.p1 - point);
    let d2 = normal.dot(s.p2 - point);
    let (short, long) = if d1.abs() <= d2.abs() { (d1, d2) } else { (d2, d1) };
    let side = if short == 0.0 { -side(long) } else { side(short) };
    (short.abs(), side)
}

fn rectangle_rectangle(a: &Rectangle, b: &Rectangle) -> Option<Contact> {
    let (ax, ay) = a.axes();
    let (bx, by) = b.axes();
    let delta = b.center - a.center;

    let mut best: Option<(f64, Vec2)> = None;
    for axis in [ax, ay, bx, by] {
        let distance = delta.dot(axis);
        let overlap = a.projected_radius(axis) + b.projected_radius(axis) - distance.abs();
        if overlap < 0.0 {
            return None;
        }
        let oriented = if distance < 0.0 { -axis } else { axis };
        if best.map_or(true, |(depth, _)| overlap < depth) {
            best = Some((overlap, oriented));
        }
    }
    let (depth, normal) = best?;

    let inside: Vec<Vec2> = b
        .corners()
        .into_iter()
        .filter(|p| a.contains_point(*p))
        .chain(a.corners().into_iter().filter(|p| b.contains_point(*p)))
        .collect();
    let position = if inside.is_empty() {
        (a.center + b.center) * 0.5
    } else {
        inside.iter().copied().sum::<Vec2>() / inside.len() as f64
    };

    Some(Contact::new(position, normal, depth))
}

fn segment_rectangle(s: &Segment, r: &Rectangle) -> Option<Contact> {
    let (ux, uy) = r.axes();
    let mut axes = vec![ux, uy];
    if let Some(unit) = s.direction().try_unit() {
        axes.push(unit.perp());
    }

    let mut best: Option<(f64, Vec2)> = None;
    for axis in axes {
        let (p1, p2) = (s.p1.dot(axis), s.p2.dot(axis));
        let (seg_min, seg_max) = (p1.min(p2), p1.max(p2));
        let center = r.center.dot(axis);
        let radius = r.projected_radius(axis);
        let (rect_min, rect_max) = (center - radius, center + radius);

        // segment leaves through the low side (normal +axis) or the high side
        let low = seg_max - rect_min;
        let high = rect_max - seg_min;
        if low < 0.0 || high < 0.0 {
            return None;
        }
        let (depth, normal) = if low <= high { (low, axis) } else { (high, -axis) };
        if best.map_or(true, |(d, _)| depth < d) {
            best = Some((depth, normal));
        }
    }
    let (depth, normal) = best?;

    Some(Contact::new(s.closest_point(r.center), normal, depth))
}
