// Collision pipeline: shapes, KD-tree broad phase, narrow phase, springs

pub mod body;
mod bounds;
pub mod collision;
mod config;
mod connection;
mod debug;
mod handle;
mod index;
mod object;
mod shape;
mod world;

pub use body::ObjectBuilder;
pub use bounds::Aabb;
pub use collision::{Contact, MergedContact};
pub use config::{IndexConfig, WorldConfig, DEFAULT_INDEX_CONFIG, DEFAULT_WORLD_CONFIG};
pub use connection::{Anchor, Connection};
pub use debug::{DebugLayer, DebugLines, DebugVertex};
pub use handle::{Arena, ConnectionHandle, Handle, ObjectHandle};
pub use index::{CandidatePair, IndexItem, SpatialIndex};
pub use object::Object;
pub use shape::{Circle, Rectangle, Segment, Shape, ShapeKind};
pub use world::{StepReport, World};

/// Physics errors
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectHandle),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(ConnectionHandle),

    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Invalid object: {0}")]
    InvalidObject(String),

    #[error("Invalid timestep: {0}")]
    InvalidTimestep(f64),

    #[error("Spatial index corrupted: {0}")]
    IndexCorrupted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physics_error_display() {
        let err = PhysicsError::ObjectNotFound(Handle::from_raw_parts(3, 1));
        assert_eq!(err.to_string(), "Object not found: #3v1");

        let err = PhysicsError::InvalidTimestep(-0.5);
        assert_eq!(err.to_string(), "Invalid timestep: -0.5");
    }
}
