//! Headless host loop.
//!
//! Drives a [`FrameHandler`] the way the engine main loop does: one frame at
//! a time in fixed phase order, paced to `maxFps`, with the timestep clamped
//! to `1 / minFps`. Runs until the handler asks to exit.

use std::time::Duration;

use motion_shared::{
    config::EngineParams,
    host::{ExitLatch, FrameHandler},
    input::Key,
};
use tokio::{sync::mpsc, time::Instant};
use tracing::{debug, info};

use crate::server::PoseServer;

/// Frame driver without a window.
pub struct HeadlessHost {
    frame_period: Duration,
    max_step: f32,
    exit: ExitLatch,
    keys_tx: mpsc::UnboundedSender<Key>,
    keys_rx: mpsc::UnboundedReceiver<Key>,
    server: Option<PoseServer>,
    frames: u64,
}

impl HeadlessHost {
    pub fn new(params: &EngineParams) -> Self {
        let (keys_tx, keys_rx) = mpsc::unbounded_channel();
        Self {
            frame_period: Duration::from_secs_f64(1.0 / f64::from(params.max_fps.max(1))),
            max_step: 1.0 / params.min_fps.max(1) as f32,
            exit: ExitLatch::default(),
            keys_tx,
            keys_rx,
            server: None,
            frames: 0,
        }
    }

    /// Delivers the server's new connections to the handler each frame.
    pub fn with_server(mut self, server: PoseServer) -> Self {
        self.server = Some(server);
        self
    }

    /// Engine control handle to give the application.
    pub fn engine_control(&self) -> ExitLatch {
        self.exit.clone()
    }

    /// Sender for key-down events, e.g. from a console thread.
    pub fn key_sender(&self) -> mpsc::UnboundedSender<Key> {
        self.keys_tx.clone()
    }

    pub fn server(&self) -> Option<&PoseServer> {
        self.server.as_ref()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs one frame through every phase.
    pub fn frame(&mut self, handler: &mut dyn FrameHandler, dt_sec: f32) {
        if let Some(server) = self.server.as_mut() {
            for peer in server.poll_connections() {
                handler.peer_connected(peer);
            }
        }

        handler.begin_frame();
        while let Ok(key) = self.keys_rx.try_recv() {
            handler.key_down(key);
        }
        handler.update(dt_sec.clamp(0.0, self.max_step));
        handler.post_update();
        handler.render_update();
        handler.post_render_update();
        handler.end_frame();
        self.frames += 1;
    }

    /// Runs paced frames until exit is requested or `max_frames` is reached.
    pub async fn run(&mut self, handler: &mut dyn FrameHandler, max_frames: Option<u64>) -> u64 {
        info!(
            frame_ms = self.frame_period.as_secs_f64() * 1000.0,
            max_step = self.max_step,
            "Host loop started"
        );
        let start_frames = self.frames;
        let mut last = Instant::now();
        let mut next = last;

        loop {
            next += self.frame_period;
            tokio::time::sleep_until(next).await;

            let now = Instant::now();
            let dt = now.duration_since(last).as_secs_f32();
            last = now;
            self.frame(handler, dt);

            if self.exit.is_requested() {
                debug!("Exit requested by application");
                break;
            }
            if max_frames.is_some_and(|max| self.frames - start_frames >= max) {
                break;
            }
        }

        let ran = self.frames - start_frames;
        info!(frames = ran, "Host loop stopped");
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion_shared::host::EngineControl;

    #[derive(Default)]
    struct PhaseLog {
        phases: Vec<String>,
        steps: Vec<f32>,
        exit: Option<ExitLatch>,
        exit_after: usize,
    }

    impl FrameHandler for PhaseLog {
        fn begin_frame(&mut self) {
            self.phases.push("begin".into());
        }
        fn key_down(&mut self, key: Key) {
            self.phases.push(format!("key:{key:?}"));
        }
        fn update(&mut self, dt_sec: f32) {
            self.phases.push("update".into());
            self.steps.push(dt_sec);
            if self.steps.len() >= self.exit_after {
                if let Some(exit) = self.exit.as_mut() {
                    exit.request_exit();
                }
            }
        }
        fn post_update(&mut self) {
            self.phases.push("post_update".into());
        }
        fn render_update(&mut self) {
            self.phases.push("render".into());
        }
        fn post_render_update(&mut self) {
            self.phases.push("post_render".into());
        }
        fn end_frame(&mut self) {
            self.phases.push("end".into());
        }
    }

    #[test]
    fn phases_run_in_engine_order() {
        let mut host = HeadlessHost::new(&EngineParams::default());
        let mut log = PhaseLog::default();
        host.key_sender().send(Key::R).unwrap();
        host.frame(&mut log, 0.001);
        assert_eq!(
            log.phases,
            ["begin", "key:R", "update", "post_update", "render", "post_render", "end"]
        );
    }

    #[test]
    fn timestep_is_clamped_to_min_fps() {
        let params = EngineParams {
            min_fps: 10,
            ..Default::default()
        };
        let mut host = HeadlessHost::new(&params);
        let mut log = PhaseLog::default();
        host.frame(&mut log, 5.0);
        host.frame(&mut log, -1.0);
        assert_eq!(log.steps, vec![0.1, 0.0]);
    }

    #[tokio::test]
    async fn run_stops_on_exit_request() {
        let params = EngineParams {
            max_fps: 1000,
            ..Default::default()
        };
        let mut host = HeadlessHost::new(&params);
        let mut log = PhaseLog {
            exit: Some(host.engine_control()),
            exit_after: 3,
            ..Default::default()
        };
        let ran = host.run(&mut log, Some(100)).await;
        assert_eq!(ran, 3);
        assert_eq!(host.frames(), 3);
    }
}
