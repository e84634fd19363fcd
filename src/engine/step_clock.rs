//! Fixed-timestep clock for the physics world
//!
//! Turns variable frame times into a bounded number of fixed steps, so the
//! world always advances by the same `dt` whatever the frame rate.

/// Target physics rate (60 steps per second)
pub const FIXED_TIMESTEP: f64 = 1.0 / 60.0;

/// Maximum number of physics steps per frame to prevent spiral of death
pub const MAX_STEPS_PER_FRAME: u32 = 5;

/// Step clock state
#[derive(Debug, Clone)]
pub struct StepClock {
    /// Unconsumed time, always below one timestep after a frame
    accumulator: f64,

    /// Seconds fed in since creation, paused frames included
    elapsed: f64,

    paused: bool,

    frame_count: u64,
    step_count: u64,

    /// Frame time passed to the last `advance`
    last_frame_time: f64,
}

impl StepClock {
    pub fn new() -> Self {
        Self {
            accumulator: 0.0,
            elapsed: 0.0,
            paused: false,
            frame_count: 0,
            step_count: 0,
            last_frame_time: 0.0,
        }
    }

    /// Feed one frame's duration in seconds, returns the number of fixed
    /// steps to run. Negative or non-finite frame times count as zero.
    pub fn advance(&mut self, frame_time: f64) -> u32 {
        let frame_time = if frame_time.is_finite() { frame_time.max(0.0) } else { 0.0 };
        self.last_frame_time = frame_time;
        self.elapsed += frame_time;
        self.frame_count += 1;

        if self.paused {
            return 0;
        }

        self.accumulator += frame_time;

        let mut steps = 0;
        while self.accumulator >= FIXED_TIMESTEP && steps < MAX_STEPS_PER_FRAME {
            self.accumulator -= FIXED_TIMESTEP;
            steps += 1;
        }

        // Drop the backlog we refused to simulate
        if steps == MAX_STEPS_PER_FRAME && self.accumulator >= FIXED_TIMESTEP {
            log::debug!("Step clock behind, dropping {:.3}s", self.accumulator);
            self.accumulator %= FIXED_TIMESTEP;
        }

        self.step_count += steps as u64;
        steps
    }

    /// Fixed timestep in seconds
    pub fn fixed_timestep(&self) -> f64 {
        FIXED_TIMESTEP
    }

    /// Interpolation factor in [0, 1) between the last two fixed steps
    pub fn alpha(&self) -> f64 {
        self.accumulator / FIXED_TIMESTEP
    }

    pub fn last_frame_time(&self) -> f64 {
        self.last_frame_time
    }

    /// Total seconds fed in
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Total fixed steps handed out
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            log::info!("Simulation paused");
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            // Reset accumulator to prevent a step burst
            self.accumulator = 0.0;
            log::info!("Simulation resumed");
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }
}

impl Default for StepClock {
    fn default() -> Self {
        Self::new()
    }
}
