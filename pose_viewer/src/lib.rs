//! `pose_viewer`
//!
//! Viewer-side systems for VR state monitoring:
//! - Connection to the bridge's pose server
//! - Scene assignment and pose record decoding
//! - Pose history with interpolation for display

pub mod history;
pub mod viewer;

pub use history::PoseHistory;
pub use viewer::{PoseViewer, ViewerEvent};
