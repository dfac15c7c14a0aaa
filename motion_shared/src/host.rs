//! Host engine lifecycle.
//!
//! The host drives a [`FrameHandler`] once per frame in a fixed phase order:
//! `begin_frame`, key events, `update`, `post_update`, `render_update`,
//! `post_render_update`, `end_frame`. Peer connections are delivered between
//! frames.

use std::sync::{
    atomic::{AtomicI32, AtomicU32, Ordering},
    Arc,
};

use crate::{input::Key, net::PeerId};

/// Process-wide terminate flag owned by an external controller.
///
/// Non-zero means "terminate". Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct ExitSignal {
    flag: Arc<AtomicI32>,
}

impl ExitSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: i32) {
        self.flag.store(value, Ordering::SeqCst);
    }

    pub fn get(&self) -> i32 {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn is_raised(&self) -> bool {
        self.get() != 0
    }
}

/// Host application control.
pub trait EngineControl: Send {
    /// Asks the host to leave its main loop after the current frame.
    fn request_exit(&mut self);
}

/// [`EngineControl`] that counts exit requests. Clones share the count.
#[derive(Debug, Clone, Default)]
pub struct ExitLatch {
    requests: Arc<AtomicU32>,
}

impl ExitLatch {
    pub fn requests(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn is_requested(&self) -> bool {
        self.requests() > 0
    }
}

impl EngineControl for ExitLatch {
    fn request_exit(&mut self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

/// Per-phase callbacks. Phases the application does not use keep the no-op
/// default.
pub trait FrameHandler {
    fn begin_frame(&mut self) {}
    fn key_down(&mut self, _key: Key) {}
    fn update(&mut self, dt_sec: f32);
    fn post_update(&mut self) {}
    fn render_update(&mut self) {}
    fn post_render_update(&mut self) {}
    fn end_frame(&mut self) {}
    fn peer_connected(&mut self, _peer: PeerId) {}
}
