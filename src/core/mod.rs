// Core utilities shared by the engine

pub mod math;
