//! Device-space to arena-space mapping.

use serde::{Deserialize, Serialize};

use crate::{
    config::TransformConfig,
    math::{Mat3, Vec3},
};

/// Fixed linear map from ball displacement to camera motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateTransform {
    /// Maps device displacement to camera-local translation.
    pub to_arena_xyz: Mat3,
    /// Dot-product weights mapping device displacement to a yaw delta.
    pub to_arena_yaw: Vec3,
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self::from(&TransformConfig::default())
    }
}

impl From<&TransformConfig> for CoordinateTransform {
    fn from(cfg: &TransformConfig) -> Self {
        Self {
            to_arena_xyz: cfg.ball_xyz_to_arena_xyz,
            to_arena_yaw: cfg.ball_xyz_to_arena_yaw,
        }
    }
}

/// Arena-specific walking and turning gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainPair {
    pub walk: f32,
    pub turn: f32,
}

impl Default for GainPair {
    fn default() -> Self {
        Self {
            walk: 1.0,
            turn: 1.0,
        }
    }
}

/// Camera motion produced by one sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionDelta {
    /// Camera-local translation.
    pub translation: Vec3,
    /// Yaw change in degrees.
    pub yaw: f32,
}

impl CoordinateTransform {
    /// Maps one device displacement through the transform and gains.
    pub fn apply(&self, displacement: Vec3, gains: GainPair) -> MotionDelta {
        MotionDelta {
            translation: (self.to_arena_xyz * displacement) * gains.walk,
            yaw: self.to_arena_yaw.dot(displacement) * gains.turn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_scales_matrix_product_and_dot_by_gains() {
        let xf = CoordinateTransform {
            to_arena_xyz: Mat3::from_rows([[0.0, 0.0, 1.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]),
            to_arena_yaw: Vec3::new(0.0, -2.0, 0.0),
        };
        let gains = GainPair { walk: 3.0, turn: 0.5 };
        let delta = xf.apply(Vec3::new(1.0, 4.0, -2.0), gains);
        assert_eq!(delta.translation, Vec3::new(-6.0, 0.0, 3.0));
        assert_eq!(delta.yaw, -4.0);
    }

    #[test]
    fn default_transform_only_turns() {
        let delta = CoordinateTransform::default().apply(Vec3::new(1.0, 1.0, 2.0), GainPair::default());
        assert_eq!(delta.translation, Vec3::ZERO);
        assert_eq!(delta.yaw, 2.0);
    }
}
