//! Motion bridge application.
//!
//! Wires the [`SampleIngestor`] and [`PoseBroadcaster`] into the host frame
//! lifecycle and handles the edge-triggered keys.
//!
//! Startup is two-step: [`MotionBridge::configure`] stores the arena script
//! path, exit signal and tracking queue; [`BridgeSetup::start`] loads the
//! arena, resolves gains and yields a running bridge. A started bridge cannot
//! be reconfigured.

use std::path::{Path, PathBuf};

use motion_shared::{
    arena::{ArenaAttributes, ArenaScript},
    camera::{CameraRig, CAMERA_HOME},
    host::{EngineControl, ExitSignal, FrameHandler},
    input::{InputSource, Key},
    net::{PeerId, PeerNetwork},
    sample::TrackingQueue,
    sample_log::SampleSink,
    transform::{CoordinateTransform, GainPair},
};
use tracing::{debug, info, warn};

use crate::{broadcast::PoseBroadcaster, ingest::SampleIngestor};

/// Host services the bridge is given at startup.
pub struct BridgeServices {
    pub camera: Box<dyn CameraRig>,
    pub input: Box<dyn InputSource>,
    pub network: Box<dyn PeerNetwork>,
    pub engine: Box<dyn EngineControl>,
    pub samples: Box<dyn SampleSink>,
}

/// Result of [`MotionBridge::configure`], waiting for `start`.
pub struct BridgeSetup {
    script_path: PathBuf,
    exit: ExitSignal,
    queue: TrackingQueue,
}

impl BridgeSetup {
    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    /// Loads the arena script from the configured path and starts.
    ///
    /// A missing script falls back to the default arena; an unreadable or
    /// malformed one is an error.
    pub fn start(
        self,
        transform: CoordinateTransform,
        services: BridgeServices,
    ) -> anyhow::Result<MotionBridge> {
        let arena = if self.script_path.exists() {
            ArenaAttributes::load(&self.script_path)?
        } else {
            warn!(path = %self.script_path.display(), "Arena script not found, using default gains");
            ArenaAttributes::default()
        };
        Ok(self.start_with_arena(&arena, transform, services))
    }

    /// Starts with an already loaded arena.
    pub fn start_with_arena(
        self,
        arena: &dyn ArenaScript,
        transform: CoordinateTransform,
        services: BridgeServices,
    ) -> MotionBridge {
        let gains = GainPair::resolve(arena, GainPair::default());
        info!(
            arena = %arena.name(),
            xyz = ?transform.to_arena_xyz,
            yaw = ?transform.to_arena_yaw,
            "Motion bridge started"
        );
        let mut services = services;
        services.input.set_mouse_visible(true);

        MotionBridge {
            ingestor: SampleIngestor::new(transform, gains, self.queue),
            broadcaster: PoseBroadcaster::new(),
            services,
            exit: self.exit,
            exit_requested: false,
            scene_name: arena.name().to_string(),
            ticks: 0,
        }
    }
}

/// Running bridge.
pub struct MotionBridge {
    ingestor: SampleIngestor,
    broadcaster: PoseBroadcaster,
    services: BridgeServices,
    exit: ExitSignal,
    exit_requested: bool,
    scene_name: String,
    ticks: u64,
}

impl MotionBridge {
    /// Stores the startup handles. Called once before the host loop.
    pub fn configure(
        script_path: impl Into<PathBuf>,
        exit: ExitSignal,
        queue: TrackingQueue,
    ) -> BridgeSetup {
        let script_path = script_path.into();
        debug!(script = %script_path.display(), exit_flag = exit.get(), "Bridge configured");
        BridgeSetup {
            script_path,
            exit,
            queue,
        }
    }

    pub fn camera(&self) -> &dyn CameraRig {
        self.services.camera.as_ref()
    }

    pub fn input(&self) -> &dyn InputSource {
        self.services.input.as_ref()
    }

    pub fn gains(&self) -> GainPair {
        self.ingestor.gains()
    }

    pub fn scene_name(&self) -> &str {
        &self.scene_name
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn poses_sent(&self) -> u64 {
        self.broadcaster.sent()
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    fn request_exit(&mut self, reason: &str) {
        if self.exit_requested {
            return;
        }
        self.exit_requested = true;
        info!(reason, ticks = self.ticks, "Requesting application exit");
        self.services.samples.flush();
        self.services.engine.request_exit();
    }

    fn reset_camera(&mut self) {
        let camera = self.services.camera.as_mut();
        camera.set_position(CAMERA_HOME);
        camera.set_yaw(0.0);
        info!("Camera reset");
    }

    fn toggle_mouse(&mut self) {
        let input = self.services.input.as_mut();
        let visible = !input.is_mouse_visible();
        let grabbed = !input.is_mouse_grabbed();
        input.set_mouse_visible(visible);
        input.set_mouse_grabbed(grabbed);
        debug!(visible, grabbed, "Mouse toggled");
    }
}

impl FrameHandler for MotionBridge {
    fn key_down(&mut self, key: Key) {
        match key {
            Key::Escape => self.request_exit("escape key"),
            Key::Tab => self.toggle_mouse(),
            Key::R => self.reset_camera(),
            _ => {}
        }
    }

    fn update(&mut self, dt_sec: f32) {
        let BridgeServices {
            camera,
            input,
            samples,
            ..
        } = &mut self.services;
        self.ingestor
            .tick(dt_sec, camera.as_mut(), input.as_ref(), samples.as_mut());
        self.ticks += 1;

        if self.exit.is_raised() {
            self.request_exit("exit flag raised");
        }
    }

    fn end_frame(&mut self) {
        let BridgeServices {
            camera, network, ..
        } = &mut self.services;
        self.broadcaster.end_frame(camera.as_ref(), network.as_mut());
    }

    fn peer_connected(&mut self, peer: PeerId) {
        info!(%peer, scene = %self.scene_name, "Peer connected, assigning scene");
        self.services.network.assign_scene(peer, &self.scene_name);
    }
}
