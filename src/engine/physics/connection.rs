use crate::core::math::Vec2;

use super::handle::{Arena, ObjectHandle};
use super::object::Object;

/// One end of a [`Connection`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Point fixed to an object, in that object's coordinates
    Object { object: ObjectHandle, local_point: Vec2 },
    /// Point fixed in world space
    World(Vec2),
}

impl Anchor {
    pub fn object(object: ObjectHandle, local_point: Vec2) -> Self {
        Anchor::Object { object, local_point }
    }

    pub fn world(point: Vec2) -> Self {
        Anchor::World(point)
    }

    /// Attached object, if any
    pub fn object_handle(&self) -> Option<ObjectHandle> {
        match self {
            Anchor::Object { object, .. } => Some(*object),
            Anchor::World(_) => None,
        }
    }

    /// Current world position; `None` when the object no longer exists
    pub fn world_point(&self, objects: &Arena<Object>) -> Option<Vec2> {
        match self {
            Anchor::Object { object, local_point } => objects.get(*object).map(|o| o.local_to_world(*local_point)),
            Anchor::World(point) => Some(*point),
        }
    }
}

/// Soft spring pulling two anchors together.
///
/// Connections only hold handles; the world drops every connection that
/// references an object when that object is removed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub a: Anchor,
    pub b: Anchor,
}

impl Connection {
    pub fn new(a: Anchor, b: Anchor) -> Self {
        Self { a, b }
    }

    /// Whether either end is attached to `object`
    pub fn references(&self, object: ObjectHandle) -> bool {
        self.a.object_handle() == Some(object) || self.b.object_handle() == Some(object)
    }

    /// World positions of both ends
    pub fn world_points(&self, objects: &Arena<Object>) -> Option<(Vec2, Vec2)> {
        Some((self.a.world_point(objects)?, self.b.world_point(objects)?))
    }

    /// Vector from end `a` to end `b`
    pub fn displacement(&self, objects: &Arena<Object>) -> Option<Vec2> {
        self.world_points(objects).map(|(a, b)| b - a)
    }
}
