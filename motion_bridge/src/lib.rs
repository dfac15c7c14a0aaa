//! `motion_bridge`
//!
//! Maps tracked locomotion-device motion onto the scene camera and
//! broadcasts the camera pose to viewers:
//! - `ingest`: per-tick sample drain and device-to-camera mapping
//! - `broadcast`: per-frame pose message to connected peers
//! - `bridge`: lifecycle wiring, startup gains, exit and key handling
//! - `server`: TCP pose server (reference peer transport)
//! - `host`: headless frame loop (reference host)

pub mod bridge;
pub mod broadcast;
pub mod host;
pub mod ingest;
pub mod server;

pub use bridge::{BridgeServices, BridgeSetup, MotionBridge};
pub use host::HeadlessHost;
pub use server::{PeerHub, PoseServer};
