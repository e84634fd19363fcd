// 2D physics sandbox core: shapes, KD-tree broad phase, contacts and springs

pub mod core;
pub mod engine;

pub use engine::physics::{
    Anchor, Connection, Object, ObjectBuilder, ObjectHandle, PhysicsError, Shape, StepReport, World,
    WorldConfig,
};
pub use engine::step_clock::StepClock;
