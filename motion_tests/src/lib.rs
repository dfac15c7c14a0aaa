//! Shared fixtures for the motion bridge integration tests.

use motion_bridge::{BridgeServices, MotionBridge};
use motion_shared::{
    arena::ArenaAttributes,
    camera::FlyCamera,
    host::{ExitLatch, ExitSignal},
    input::NullInput,
    net::RecordingNetwork,
    sample::{tracking_channel, TrackingSender},
    sample_log::MemorySampleSink,
    transform::CoordinateTransform,
};

/// Installs a test-writer subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

/// A started bridge with in-memory collaborators.
pub struct Rig {
    pub bridge: MotionBridge,
    pub tracking: TrackingSender,
    pub exit: ExitSignal,
    pub engine: ExitLatch,
    pub network: RecordingNetwork,
    pub samples: MemorySampleSink,
}

impl Rig {
    pub fn new(transform: CoordinateTransform, arena: &ArenaAttributes) -> Self {
        let (tracking, queue) = tracking_channel();
        let exit = ExitSignal::new();
        let engine = ExitLatch::default();
        let network = RecordingNetwork::default();
        let samples = MemorySampleSink::default();

        let bridge = MotionBridge::configure("arena.json", exit.clone(), queue).start_with_arena(
            arena,
            transform,
            BridgeServices {
                camera: Box::new(FlyCamera::default()),
                input: Box::new(NullInput::default()),
                network: Box::new(network.clone()),
                engine: Box::new(engine.clone()),
                samples: Box::new(samples.clone()),
            },
        );

        Self {
            bridge,
            tracking,
            exit,
            engine,
            network,
            samples,
        }
    }
}
