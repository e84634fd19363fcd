// Math utilities and helper functions

/// 2D vector in double precision
pub type Vec2 = glam::DVec2;

/// 2x3 affine transform (rotation, translation and optional scale)
pub type Affine2 = glam::DAffine2;

/// Tolerance used to detect degenerate lengths and denominators
pub const EPSILON: f64 = 1e-9;

/// Operations on [`Vec2`] that glam does not name the way the engine uses them
pub trait Vec2Ext {
    /// 2D cross product (z component of the 3D cross product)
    fn det(self, other: Self) -> f64;

    /// Signed angle from `self` to `other`, counter-clockwise positive, in (-pi, pi]
    fn signed_angle(self, other: Self) -> f64;

    /// Rotate counter-clockwise by `angle` radians
    fn rotated(self, angle: f64) -> Self;

    /// Unit vector, or `None` if the length is too small to normalize
    fn try_unit(self) -> Option<Self>
    where
        Self: Sized;
}

impl Vec2Ext for Vec2 {
    fn det(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    fn signed_angle(self, other: Self) -> f64 {
        self.det(other).atan2(self.dot(other))
    }

    fn rotated(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    fn try_unit(self) -> Option<Self> {
        let length = self.length();
        if length > EPSILON {
            Some(self / length)
        } else {
            None
        }
    }
}

/// Transform placing a local frame at `position`, rotated by `angle`.
///
/// Local points are rotated first and translated second.
pub fn pose_transform(position: Vec2, angle: f64) -> Affine2 {
    Affine2::from_angle_translation(angle, position)
}

/// Linear interpolation
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Check if two f64 values are approximately equal
pub fn approx_equal(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}
