//! Camera abstraction.
//!
//! The camera node belongs to the host scene. The bridge only moves it
//! through [`CameraRig`].

use serde::{Deserialize, Serialize};

use crate::math::{wrap_degrees, Vec3};

/// Fixed eye height the camera is clamped to every tick.
pub const CAMERA_HEIGHT: f32 = 0.2;

/// Position the reset key returns the camera to.
pub const CAMERA_HOME: Vec3 = Vec3::new(0.0, CAMERA_HEIGHT, 0.0);

/// Camera position plus heading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CameraPose {
    pub position: Vec3,
    /// Degrees about the vertical axis, in `(-180, 180]`.
    pub yaw: f32,
}

/// Host camera node.
pub trait CameraRig: Send {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
    /// Heading in degrees, `(-180, 180]`.
    fn yaw(&self) -> f32;
    fn set_yaw(&mut self, degrees: f32);

    /// Translates in camera-local axes.
    fn translate_local(&mut self, delta: Vec3) {
        let world = delta.rotated_about_up(self.yaw());
        self.set_position(self.position() + world);
    }

    /// Turns about the vertical axis by `degrees`.
    fn turn(&mut self, degrees: f32) {
        self.set_yaw(self.yaw() + degrees);
    }

    fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position(),
            yaw: self.yaw(),
        }
    }
}

/// Free-flying camera used by the headless host and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyCamera {
    position: Vec3,
    yaw: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self {
            position: CAMERA_HOME,
            yaw: 0.0,
        }
    }
}

impl FlyCamera {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            yaw: wrap_degrees(yaw),
        }
    }
}

impl CameraRig for FlyCamera {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn yaw(&self) -> f32 {
        self.yaw
    }

    fn set_yaw(&mut self, degrees: f32) {
        self.yaw = wrap_degrees(degrees);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_forward_follows_heading() {
        let mut cam = FlyCamera::new(Vec3::ZERO, 90.0);
        cam.translate_local(Vec3::new(0.0, 0.0, 2.0));
        let p = cam.position();
        assert!((p.x - 2.0).abs() < 1e-5);
        assert!(p.z.abs() < 1e-5);
    }

    #[test]
    fn turning_wraps_heading() {
        let mut cam = FlyCamera::default();
        cam.turn(170.0);
        cam.turn(20.0);
        assert!((cam.yaw() - -170.0).abs() < 1e-4);
        assert_eq!(cam.pose().position, CAMERA_HOME);
    }
}
