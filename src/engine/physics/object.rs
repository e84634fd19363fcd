use crate::core::math::{pose_transform, Affine2, Vec2, Vec2Ext};

use super::bounds::Aabb;
use super::shape::Shape;

/// World-space collision data derived from an object's pose and shapes
#[derive(Debug, Clone)]
struct WorldCache {
    shapes: Vec<Shape>,
    bounds: Aabb,
}

/// Rigid shape made of primitives, with its kinematic state.
///
/// World-space shapes and bounds are computed on first read after any
/// change to the pose or the local shapes, and reused until the next change.
#[derive(Debug, Clone)]
pub struct Object {
    name: Option<String>,

    position: Vec2,
    angle: f64,

    velocity: Vec2,
    angular_velocity: f64,

    /// Fixed objects never move: no integration, correction or forces
    fixed: bool,
    weight: f64,
    /// Lever-arm scale for torque response
    weight_distribution: f64,

    /// Collision model in object coordinates
    shapes: Vec<Shape>,
    cache: Option<WorldCache>,
}

impl Object {
    /// Create an empty, movable object at the origin
    pub fn new() -> Self {
        Self {
            name: None,
            position: Vec2::ZERO,
            angle: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            fixed: false,
            weight: 1.0,
            weight_distribution: 1.0,
            shapes: Vec::new(),
            cache: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    // Pose

    pub fn pose(&self) -> (Vec2, f64) {
        (self.position, self.angle)
    }

    pub fn set_pose(&mut self, position: Vec2, angle: f64) {
        self.position = position;
        self.angle = angle;
        self.invalidate();
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.invalidate();
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.angle = angle;
        self.invalidate();
    }

    // Motion

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: f64) {
        self.angular_velocity = angular_velocity;
    }

    pub fn fixed(&self) -> bool {
        self.fixed
    }

    pub fn set_fixed(&mut self, fixed: bool) {
        self.fixed = fixed;
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub fn weight_distribution(&self) -> f64 {
        self.weight_distribution
    }

    pub fn set_weight_distribution(&mut self, weight_distribution: f64) {
        self.weight_distribution = weight_distribution;
    }

    // Shapes

    /// Local-space collision model
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn add_shape(&mut self, shape: impl Into<Shape>) {
        self.shapes.push(shape.into());
        self.invalidate();
    }

    /// Mutable access to the local shapes; invalidates the cache
    pub fn shapes_mut(&mut self) -> &mut Vec<Shape> {
        self.invalidate();
        &mut self.shapes
    }

    /// Push every defining point away from `local_point`.
    ///
    /// A point at distance `d` moves by `exp(-0.5 d) * strength` along the
    /// outward direction; a point exactly at `local_point` stays put.
    pub fn deform(&mut self, local_point: Vec2, strength: f64) {
        let push = |p: Vec2| {
            let away = p - local_point;
            match away.try_unit() {
                Some(dir) => p + dir * ((-0.5 * away.length()).exp() * strength),
                None => p,
            }
        };
        for shape in &mut self.shapes {
            shape.map_points(push);
        }
        self.invalidate();
    }

    // Forces

    /// Apply a force given in object coordinates at `local_point`.
    ///
    /// The off-center part turns the object: the factor
    /// `|p| / wd * sin(angle(p, f))` clamped to [-1, 1] drives the angular
    /// velocity, and the remaining `1 - |factor|` share moves it.
    pub fn apply_local_force(&mut self, force: Vec2, local_point: Vec2) {
        if self.fixed {
            return;
        }
        let distribution = self.weight_distribution;
        let factor = (local_point.length() / distribution * local_point.signed_angle(force).sin())
            .clamp(-1.0, 1.0);

        self.angular_velocity += force.length() * factor / distribution;
        self.velocity += force.rotated(self.angle) * (1.0 - factor.abs());
    }

    // Frames

    pub fn transform(&self) -> Affine2 {
        pose_transform(self.position, self.angle)
    }

    pub fn local_to_world(&self, point: Vec2) -> Vec2 {
        point.rotated(self.angle) + self.position
    }

    pub fn world_to_local(&self, point: Vec2) -> Vec2 {
        (point - self.position).rotated(-self.angle)
    }

    /// Rotate a world direction into object coordinates
    pub fn world_to_local_vector(&self, vector: Vec2) -> Vec2 {
        vector.rotated(-self.angle)
    }

    // Cached world data

    /// Whether world shapes and bounds are currently cached
    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    fn invalidate(&mut self) {
        self.cache = None;
    }

    fn cache(&mut self) -> &WorldCache {
        let (position, angle) = (self.position, self.angle);
        let local = &self.shapes;
        self.cache.get_or_insert_with(|| {
            let transform = pose_transform(position, angle);
            let shapes: Vec<Shape> = local.iter().map(|s| s.transformed(&transform)).collect();
            let bounds = shapes.iter().fold(Aabb::EMPTY, |acc, s| acc + s.bounds());
            WorldCache { shapes, bounds }
        })
    }

    /// World-space copies of the shapes, recomputed only when stale
    pub fn world_shapes(&mut self) -> &[Shape] {
        &self.cache().shapes
    }

    /// Union of the world shape bounds, recomputed only when stale
    pub fn bounds(&mut self) -> Aabb {
        self.cache().bounds
    }

    /// Cached bounds without recomputing; `None` when stale
    pub fn cached_bounds(&self) -> Option<Aabb> {
        self.cache.as_ref().map(|c| c.bounds)
    }

    /// Cached world shapes without recomputing; `None` when stale
    pub fn cached_world_shapes(&self) -> Option<&[Shape]> {
        self.cache.as_ref().map(|c| c.shapes.as_slice())
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}
