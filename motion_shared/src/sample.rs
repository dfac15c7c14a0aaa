//! Tracking samples and the queue that carries them.
//!
//! A tracking process on another thread pushes [`DisplacementSample`]s
//! through a [`TrackingSender`]; the simulation thread drains the matching
//! [`TrackingQueue`] once per tick. The channel is unbounded and the consumer
//! never drops samples.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// One tracked-device reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplacementSample {
    /// Device clock units, monotonic.
    pub timestamp: u64,
    /// Device-space displacement since the previous sample.
    pub displacement: Vec3,
}

impl DisplacementSample {
    pub const fn new(timestamp: u64, displacement: Vec3) -> Self {
        Self {
            timestamp,
            displacement,
        }
    }

    /// Decodes the legacy four-double layout `[timestamp, rx, ry, rz]`.
    ///
    /// Older trackers stored the integer timestamp's bits in the first slot,
    /// so the slot is reinterpreted rather than converted.
    pub fn from_packed(packed: [f64; 4]) -> Self {
        Self {
            timestamp: packed[0].to_bits(),
            displacement: Vec3::new(packed[1] as f32, packed[2] as f32, packed[3] as f32),
        }
    }
}

/// Creates a connected producer/consumer pair.
pub fn tracking_channel() -> (TrackingSender, TrackingQueue) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (TrackingSender { tx }, TrackingQueue { rx })
}

/// Producer side. Cloneable; any number of producers may push.
#[derive(Debug, Clone)]
pub struct TrackingSender {
    tx: Sender<DisplacementSample>,
}

impl TrackingSender {
    /// Pushes a sample. Returns `false` once the consumer is gone.
    pub fn push(&self, sample: DisplacementSample) -> bool {
        self.tx.send(sample).is_ok()
    }

    /// Pushes a sample in the legacy packed layout.
    pub fn push_packed(&self, packed: [f64; 4]) -> bool {
        self.push(DisplacementSample::from_packed(packed))
    }

    /// Samples queued and not yet consumed.
    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

/// Consumer side, owned by the simulation thread.
#[derive(Debug)]
pub struct TrackingQueue {
    rx: Receiver<DisplacementSample>,
}

impl TrackingQueue {
    /// Non-blocking pop. `None` when nothing is queued right now.
    pub fn try_pop(&self) -> Option<DisplacementSample> {
        match self.rx.try_recv() {
            Ok(sample) => Some(sample),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_layout_reinterprets_timestamp_bits() {
        let ts: u64 = 1_234_567_890_123;
        let sample = DisplacementSample::from_packed([f64::from_bits(ts), 0.5, -1.0, 2.0]);
        assert_eq!(sample.timestamp, ts);
        assert_eq!(sample.displacement, Vec3::new(0.5, -1.0, 2.0));
    }

    #[test]
    fn queue_is_fifo_across_producers() {
        let (tx, queue) = tracking_channel();
        let tx2 = tx.clone();
        assert!(tx.push(DisplacementSample::new(1, Vec3::ZERO)));
        assert!(tx2.push(DisplacementSample::new(2, Vec3::UP)));
        assert_eq!(queue.len(), 2);
        assert_eq!(tx.pending(), 2);
        assert_eq!(queue.try_pop().map(|s| s.timestamp), Some(1));
        assert_eq!(queue.try_pop().map(|s| s.timestamp), Some(2));
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn pop_after_producers_drop_drains_then_stops() {
        let (tx, queue) = tracking_channel();
        tx.push(DisplacementSample::new(7, Vec3::ZERO));
        drop(tx);
        assert_eq!(queue.try_pop().map(|s| s.timestamp), Some(7));
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn packed_push_reaches_consumer() {
        let (tx, queue) = tracking_channel();
        assert!(tx.push_packed([f64::from_bits(99), 0.25, 0.0, -4.0]));
        let sample = queue.try_pop().unwrap();
        assert_eq!(sample.timestamp, 99);
        assert_eq!(sample.displacement, Vec3::new(0.25, 0.0, -4.0));
        assert!(queue.is_empty());

        drop(queue);
        assert!(!tx.push_packed([0.0; 4]));
    }
}
