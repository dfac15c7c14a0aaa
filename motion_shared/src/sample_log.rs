//! Per-sample data log.
//!
//! Every processed tracking sample produces one [`SampleRecord`] so device
//! readings can be correlated with camera poses offline.

use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
    sync::{Arc, Mutex},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, warn, Level};

/// Log target for per-sample events.
pub const SAMPLE_LOG_TARGET: &str = "motion_bridge::samples";

/// Level of per-sample events. Below the default `info` filter, since
/// trackers run at hundreds of hertz.
pub const SAMPLE_LOG_LEVEL: Level = Level::DEBUG;

/// One line of the sample log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub timestamp: u64,
    pub rx: f32,
    pub ry: f32,
    pub rz: f32,
    pub camera_x: f32,
    pub camera_z: f32,
    pub camera_yaw: f32,
}

impl SampleRecord {
    /// Space-separated fields in declaration order.
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} {} {} {} {}",
            self.timestamp, self.rx, self.ry, self.rz, self.camera_x, self.camera_z, self.camera_yaw
        )
    }
}

/// Destination for sample records.
pub trait SampleSink: Send {
    fn record(&mut self, rec: &SampleRecord);

    fn flush(&mut self) {}
}

/// Emits each record as a structured `tracing` event.
#[derive(Debug, Default)]
pub struct TracingSampleSink;

impl SampleSink for TracingSampleSink {
    fn record(&mut self, rec: &SampleRecord) {
        tracing::event!(
            target: SAMPLE_LOG_TARGET,
            SAMPLE_LOG_LEVEL,
            timestamp = rec.timestamp,
            rx = rec.rx,
            ry = rec.ry,
            rz = rec.rz,
            camera_x = rec.camera_x,
            camera_z = rec.camera_z,
            camera_yaw = rec.camera_yaw,
            "sample"
        );
    }
}

/// Appends one wall-clock stamped line per record to a file.
pub struct FileSampleSink {
    out: BufWriter<File>,
    failed: bool,
}

impl FileSampleSink {
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open sample log {}", path.display()))?;
        info!(path = %path.display(), "Sample log opened");
        Ok(Self {
            out: BufWriter::new(file),
            failed: false,
        })
    }
}

impl SampleSink for FileSampleSink {
    fn record(&mut self, rec: &SampleRecord) {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f");
        if let Err(e) = writeln!(self.out, "[{stamp}] {}", rec.to_line()) {
            // Report once; keep the simulation running.
            if !self.failed {
                warn!(error = %e, "Sample log write failed");
                self.failed = true;
            }
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.out.flush() {
            warn!(error = %e, "Sample log flush failed");
        }
    }
}

impl Drop for FileSampleSink {
    fn drop(&mut self) {
        let _ = self.out.flush();
    }
}

/// Keeps records in memory. Clones share the buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySampleSink {
    records: Arc<Mutex<Vec<SampleRecord>>>,
}

impl MemorySampleSink {
    pub fn records(&self) -> Vec<SampleRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl SampleSink for MemorySampleSink {
    fn record(&mut self, rec: &SampleRecord) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(*rec);
    }
}

/// Fans records out to several sinks.
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Box<dyn SampleSink>>,
}

impl SinkSet {
    pub fn with(mut self, sink: impl SampleSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl SampleSink for SinkSet {
    fn record(&mut self, rec: &SampleRecord) {
        for sink in &mut self.sinks {
            sink.record(rec);
        }
    }

    fn flush(&mut self) {
        for sink in &mut self.sinks {
            sink.flush();
        }
    }
}
