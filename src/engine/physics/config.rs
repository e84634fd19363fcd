// Simulation tuning - every world starts from DEFAULT_WORLD_CONFIG

/// KD-tree build parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexConfig {
    /// Nodes at this depth never split
    pub max_depth: u32,
    /// A leaf may split once it holds more items than this
    pub leaf_capacity: usize,
    /// Items covering at least this fraction of a leaf land in both halves,
    /// so a leaf made only of such items is not split
    pub coverage_threshold: f64,
}

/// Step parameters for a [`World`](super::World)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldConfig {
    // Motion
    /// Linear and angular damping per second
    pub viscosity: f64,

    // Constraints
    /// Scale from anchor displacement to spring force
    pub spring_gain: f64,

    // Collision response
    /// Max angle (radians) between the contact normal and the center line
    /// for the contact normal to be used as the push direction
    pub normal_tolerance: f64,

    // Interaction
    /// Displacement applied by [`World::deform_at`](super::World::deform_at)
    pub deform_strength: f64,

    pub index: IndexConfig,
}

pub const DEFAULT_INDEX_CONFIG: IndexConfig = IndexConfig {
    max_depth: 15,
    leaf_capacity: 4,
    coverage_threshold: 0.9,
};

pub const DEFAULT_WORLD_CONFIG: WorldConfig = WorldConfig {
    viscosity: 0.5,
    spring_gain: 0.05,
    normal_tolerance: 0.15,
    deform_strength: 0.2,
    index: DEFAULT_INDEX_CONFIG,
};

impl Default for IndexConfig {
    fn default() -> Self {
        DEFAULT_INDEX_CONFIG
    }
}

impl IndexConfig {
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_leaf_capacity(mut self, leaf_capacity: usize) -> Self {
        self.leaf_capacity = leaf_capacity;
        self
    }

    pub fn with_coverage_threshold(mut self, coverage_threshold: f64) -> Self {
        self.coverage_threshold = coverage_threshold;
        self
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        DEFAULT_WORLD_CONFIG
    }
}

impl WorldConfig {
    pub fn with_viscosity(mut self, viscosity: f64) -> Self {
        self.viscosity = viscosity;
        self
    }

    pub fn with_spring_gain(mut self, spring_gain: f64) -> Self {
        self.spring_gain = spring_gain;
        self
    }

    pub fn with_normal_tolerance(mut self, normal_tolerance: f64) -> Self {
        self.normal_tolerance = normal_tolerance;
        self
    }

    pub fn with_deform_strength(mut self, deform_strength: f64) -> Self {
        self.deform_strength = deform_strength;
        self
    }

    pub fn with_index(mut self, index: IndexConfig) -> Self {
        self.index = index;
        self
    }
}
