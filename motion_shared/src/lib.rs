//! `motion_shared`
//!
//! Shared libraries for the motion bridge and its viewers.
//!
//! Design goals:
//! - Host engine services behind small traits (camera, input, peers, engine
//!   control, arena script, sample sink) so the bridge can be driven headless.
//! - Plain data for samples, transforms and poses.
//! - No `unsafe`.

pub mod arena;
pub mod camera;
pub mod config;
pub mod host;
pub mod input;
pub mod math;
pub mod net;
pub mod sample;
pub mod sample_log;
pub mod tracker;
pub mod transform;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::arena::*;
    pub use crate::camera::*;
    pub use crate::config::*;
    pub use crate::host::*;
    pub use crate::input::*;
    pub use crate::math::*;
    pub use crate::net::*;
    pub use crate::sample::*;
    pub use crate::sample_log::*;
    pub use crate::transform::*;
}
