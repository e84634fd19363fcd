// Engine modules: physics and simulation timing

pub mod physics;
pub mod step_clock;
