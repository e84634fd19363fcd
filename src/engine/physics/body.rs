use crate::core::math::Vec2;

use super::object::Object;
use super::shape::Shape;

/// Builder for objects with common configurations
#[derive(Debug, Clone)]
pub struct ObjectBuilder {
    name: Option<String>,
    position: Vec2,
    angle: f64,
    velocity: Vec2,
    angular_velocity: f64,
    fixed: bool,
    weight: f64,
    weight_distribution: f64,
    shapes: Vec<Shape>,
}

impl ObjectBuilder {
    /// Create a movable object (integrated, pushed by contacts and springs)
    pub fn new_movable() -> Self {
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
        }
    }

    /// Create a fixed object (never moves)
    pub fn new_fixed() -> Self {
        Self {
            fixed: true,
            ..Self::new_movable()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the initial position
    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    /// Set the initial position and rotation
    pub fn position_rotation(mut self, x: f64, y: f64, angle: f64) -> Self {
        self.position = Vec2::new(x, y);
        self.angle = angle;
        self
    }

    /// Set the initial linear velocity
    pub fn velocity(mut self, x: f64, y: f64) -> Self {
        self.velocity = Vec2::new(x, y);
        self
    }

    /// Set the initial angular velocity (radians per second)
    pub fn angular_velocity(mut self, angular_velocity: f64) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn weight_distribution(mut self, weight_distribution: f64) -> Self {
        self.weight_distribution = weight_distribution;
        self
    }

    /// Add a primitive in object coordinates
    pub fn shape(mut self, shape: impl Into<Shape>) -> Self {
        self.shapes.push(shape.into());
        self
    }

    pub fn shapes(mut self, shapes: impl IntoIterator<Item = Shape>) -> Self {
        self.shapes.extend(shapes);
        self
    }

    /// Build the object
    pub fn build(self) -> Object {
        let mut object = Object::new();
        if let Some(name) = self.name {
            object.set_name(name);
        }
        object.set_pose(self.position, self.angle);
        object.set_velocity(self.velocity);
        object.set_angular_velocity(self.angular_velocity);
        object.set_fixed(self.fixed);
        object.set_weight(self.weight);
        object.set_weight_distribution(self.weight_distribution);
        object.shapes_mut().extend(self.shapes);
        object
    }
}

impl Default for ObjectBuilder {
    fn default() -> Self {
        Self::new_movable()
    }
}

/// Common object configurations for sandbox scenes
pub mod presets {
    use super::*;

    /// Single circle centered on the object origin
    pub fn ball(x: f64, y: f64, radius: f64) -> Object {
        ObjectBuilder::new_movable()
            .position(x, y)
            .shape(Shape::circle(Vec2::ZERO, radius))
            .build()
    }

    /// Grid of `columns` x `rows` touching circles, centered on the object origin
    pub fn circle_cluster(x: f64, y: f64, columns: usize, rows: usize, radius: f64) -> Object {
        let step = radius * 2.0;
        let offset = Vec2::new(columns.saturating_sub(1) as f64, rows.saturating_sub(1) as f64) * step * 0.5;
        let circles = (0..rows).flat_map(move |row| {
            (0..columns).map(move |column| Shape::circle(Vec2::new(column as f64, row as f64) * step - offset, radius))
        });
        ObjectBuilder::new_movable()
            .position(x, y)
            .weight((columns * rows).max(1) as f64)
            .weight_distribution(offset.length().max(radius))
            .shapes(circles)
            .build()
    }

    /// Fixed rectangular wall
    pub fn wall(x: f64, y: f64, width: f64, height: f64, angle: f64) -> Object {
        ObjectBuilder::new_fixed()
            .position_rotation(x, y, angle)
            .shape(Shape::rectangle(Vec2::ZERO, Vec2::new(width, height), 0.0))
            .build()
    }

    /// Movable rod between two local endpoints
    pub fn rod(x: f64, y: f64, half_length: f64, angle: f64) -> Object {
        ObjectBuilder::new_movable()
            .position_rotation(x, y, angle)
            .shape(Shape::segment(Vec2::new(-half_length, 0.0), Vec2::new(half_length, 0.0)))
            .weight_distribution(half_length.max(f64::EPSILON))
            .build()
    }
}
