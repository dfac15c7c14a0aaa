//! Synthetic ball tracker.
//!
//! Stands in for the tracking hardware when none is attached: a background
//! thread pushes a smoothed random walk of displacements into the tracking
//! queue at a fixed rate.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};

use crate::{
    math::Vec3,
    sample::{DisplacementSample, TrackingSender},
};

/// Random-walk parameters.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticConfig {
    pub rate_hz: u32,
    /// Largest per-axis change between consecutive samples.
    pub jitter: f32,
    /// Largest per-axis displacement magnitude.
    pub max_displacement: f32,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            rate_hz: 500,
            jitter: 0.002,
            max_displacement: 0.02,
            seed: 0x5eed,
        }
    }
}

/// Produces the next displacement of a bounded random walk.
#[derive(Debug)]
pub struct RandomWalk {
    rng: StdRng,
    current: Vec3,
    cfg: SyntheticConfig,
}

impl RandomWalk {
    pub fn new(cfg: SyntheticConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(cfg.seed),
            current: Vec3::ZERO,
            cfg,
        }
    }

    pub fn next_displacement(&mut self) -> Vec3 {
        let j = self.cfg.jitter;
        let m = self.cfg.max_displacement;
        let step = Vec3::new(
            self.rng.gen_range(-j..=j),
            self.rng.gen_range(-j..=j),
            self.rng.gen_range(-j..=j),
        );
        let next = self.current + step;
        self.current = Vec3::new(next.x.clamp(-m, m), next.y.clamp(-m, m), next.z.clamp(-m, m));
        self.current
    }
}

/// Running synthetic tracker. Stops when dropped.
pub struct SyntheticTracker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<u64>>,
}

impl SyntheticTracker {
    /// Spawns the producer thread.
    pub fn spawn(tx: TrackingSender, cfg: SyntheticConfig) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let period = Duration::from_secs_f64(1.0 / f64::from(cfg.rate_hz.max(1)));
        info!(rate_hz = cfg.rate_hz, "Synthetic tracker started");

        let handle = thread::spawn(move || {
            let mut walk = RandomWalk::new(cfg);
            let start = Instant::now();
            let mut next = start;
            let mut produced = 0u64;
            while !stop_flag.load(Ordering::Relaxed) {
                // Device clock: microseconds since the tracker started.
                let timestamp = start.elapsed().as_micros() as u64;
                if !tx.push(DisplacementSample::new(timestamp, walk.next_displacement())) {
                    debug!("Tracking queue closed");
                    break;
                }
                produced += 1;
                next += period;
                if let Some(wait) = next.checked_duration_since(Instant::now()) {
                    thread::sleep(wait);
                }
            }
            produced
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Stops the thread and returns how many samples it produced.
    pub fn stop(mut self) -> u64 {
        self.shutdown()
    }

    fn shutdown(&mut self) -> u64 {
        self.stop.store(true, Ordering::Relaxed);
        let produced = self
            .handle
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or(0);
        if produced > 0 {
            info!(produced, "Synthetic tracker stopped");
        }
        produced
    }
}

impl Drop for SyntheticTracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
