//! Configuration system.
//!
//! Loads bridge configuration from JSON. Every section and key is optional;
//! missing values fall back to the defaults below. Key names inside the
//! `engine` and `transforms` sections match the names used in existing
//! `vr.cfg` deployments.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::math::{Mat3, Vec3};

/// Default TCP port viewers connect to.
pub const DEFAULT_POSE_PORT: u16 = 2345;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub engine: EngineParams,
    pub transforms: TransformConfig,
    pub network: NetworkConfig,
    pub logging: LoggingConfig,
}

/// Display and frame pacing parameters handed to the host engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct EngineParams {
    pub full_screen: bool,
    pub window_width: u32,
    pub window_height: u32,
    #[serde(rename = "WindowPositionX")]
    pub window_position_x: u32,
    #[serde(rename = "WindowPositionY")]
    pub window_position_y: u32,
    pub window_resizable: bool,
    pub borderless: bool,
    #[serde(rename = "VSync")]
    pub vsync: bool,
    /// Frames per second below which the timestep is clamped.
    #[serde(rename = "minFps")]
    pub min_fps: u32,
    #[serde(rename = "maxFps")]
    pub max_fps: u32,
    #[serde(rename = "maxInactiveFps")]
    pub max_inactive_fps: u32,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            full_screen: false,
            window_width: 1920 / 2,
            window_height: 1080 / 2,
            window_position_x: 1000,
            window_position_y: 50,
            window_resizable: false,
            borderless: false,
            vsync: false,
            min_fps: 120,
            max_fps: 240,
            max_inactive_fps: 240,
        }
    }
}

/// Ball-to-arena coordinate transforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    #[serde(rename = "ballXYZtoArenaXYZ")]
    pub ball_xyz_to_arena_xyz: Mat3,
    #[serde(rename = "ballXYZtoArenaYaw")]
    pub ball_xyz_to_arena_yaw: Vec3,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            ball_xyz_to_arena_xyz: Mat3::ZERO,
            ball_xyz_to_arena_yaw: Vec3::FORWARD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Pose server listen address, e.g. `0.0.0.0:2345`.
    pub listen_addr: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: format!("0.0.0.0:{DEFAULT_POSE_PORT}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub filter: String,
    /// File that receives one line per tracking sample.
    pub sample_log: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            sample_log: None,
        }
    }
}

impl BridgeConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Reads and parses a config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parse config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = BridgeConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, BridgeConfig::default());
        assert_eq!(cfg.engine.window_width, 960);
        assert_eq!(cfg.engine.min_fps, 120);
        assert_eq!(cfg.transforms.ball_xyz_to_arena_xyz, Mat3::ZERO);
        assert_eq!(cfg.transforms.ball_xyz_to_arena_yaw, Vec3::FORWARD);
        assert_eq!(cfg.network.listen_addr, "0.0.0.0:2345");
    }

    #[test]
    fn transforms_section_parses_legacy_keys() {
        let cfg = BridgeConfig::from_json_str(
            r#"{
                "engine": { "FullScreen": true, "WindowWidth": 1280, "maxFps": 90 },
                "transforms": {
                    "ballXYZtoArenaXYZ": [[0, 0, 0], [0, 0, 0], [1, 0, 0]],
                    "ballXYZtoArenaYaw": { "x": 0, "y": 0, "z": -1 }
                }
            }"#,
        )
        .unwrap();
        assert!(cfg.engine.full_screen);
        assert_eq!(cfg.engine.window_width, 1280);
        assert_eq!(cfg.engine.window_height, 540);
        assert_eq!(cfg.engine.max_fps, 90);
        assert_eq!(cfg.transforms.ball_xyz_to_arena_xyz.m[2], [1.0, 0.0, 0.0]);
        assert_eq!(cfg.transforms.ball_xyz_to_arena_yaw, Vec3::BACK);
    }
}
