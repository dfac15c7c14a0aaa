//! Tracking sample ingestion.
//!
//! Runs once per simulation tick:
//! 1. clamp camera height,
//! 2. apply held movement keys,
//! 3. drain the tracking queue, logging and applying every sample.

use motion_shared::{
    camera::{CameraRig, CAMERA_HEIGHT},
    input::{InputSource, MovementKeys},
    sample::TrackingQueue,
    sample_log::{SampleRecord, SampleSink},
    transform::{CoordinateTransform, GainPair},
};
use tracing::trace;

/// Keyboard fly speed in world units per second.
pub const MOVE_SPEED: f32 = 50.0;

/// Maps queued device samples onto the camera.
pub struct SampleIngestor {
    transform: CoordinateTransform,
    gains: GainPair,
    queue: TrackingQueue,
    move_speed: f32,
}

impl SampleIngestor {
    pub fn new(transform: CoordinateTransform, gains: GainPair, queue: TrackingQueue) -> Self {
        Self {
            transform,
            gains,
            queue,
            move_speed: MOVE_SPEED,
        }
    }

    pub fn gains(&self) -> GainPair {
        self.gains
    }

    /// Runs one tick and returns how many samples were applied.
    pub fn tick(
        &mut self,
        dt_sec: f32,
        camera: &mut dyn CameraRig,
        input: &dyn InputSource,
        sink: &mut dyn SampleSink,
    ) -> usize {
        clamp_height(camera);

        for dir in MovementKeys::poll(input).directions() {
            camera.translate_local(dir * (self.move_speed * dt_sec));
        }

        // Logged pose is taken once, after keyboard motion and before any
        // sample of this tick is applied.
        let before = camera.pose();

        let mut applied = 0;
        while let Some(sample) = self.queue.try_pop() {
            let v = sample.displacement;
            sink.record(&SampleRecord {
                timestamp: sample.timestamp,
                rx: v.x,
                ry: v.y,
                rz: v.z,
                camera_x: before.position.x,
                camera_z: before.position.z,
                camera_yaw: before.yaw,
            });

            let delta = self.transform.apply(v, self.gains);
            camera.translate_local(delta.translation);
            camera.turn(delta.yaw);
            applied += 1;
        }

        // The mapping may carry a vertical component; height stays fixed.
        clamp_height(camera);

        if applied > 0 {
            trace!(applied, "Tracking samples applied");
        }
        applied
    }
}

fn clamp_height(camera: &mut dyn CameraRig) {
    let mut pos = camera.position();
    pos.y = CAMERA_HEIGHT;
    camera.set_position(pos);
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion_shared::{
        camera::FlyCamera,
        input::{Key, NullInput, ScriptedInput},
        math::{Mat3, Vec3},
        sample::{tracking_channel, DisplacementSample},
        sample_log::MemorySampleSink,
    };

    fn forward_walker() -> CoordinateTransform {
        // Ball x drives forward motion, ball z drives yaw.
        CoordinateTransform {
            to_arena_xyz: Mat3::from_rows([[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]),
            to_arena_yaw: Vec3::new(0.0, 0.0, 1.0),
        }
    }

    #[test]
    fn drain_applies_every_sample_in_order() {
        let (tx, queue) = tracking_channel();
        let mut ingestor = SampleIngestor::new(forward_walker(), GainPair { walk: 2.0, turn: 1.0 }, queue);
        for ts in 1..=3 {
            tx.push(DisplacementSample::new(ts, Vec3::new(1.0, 0.0, 0.0)));
        }
        let mut cam = FlyCamera::default();
        let mut sink = MemorySampleSink::default();
        let n = ingestor.tick(0.016, &mut cam, &NullInput::default(), &mut sink);

        assert_eq!(n, 3);
        assert_eq!(tx.pending(), 0);
        let stamps: Vec<u64> = sink.records().iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![1, 2, 3]);
        assert!((cam.position().z - 6.0).abs() < 1e-5);
    }

    #[test]
    fn turn_then_walk_moves_along_new_heading() {
        let (tx, queue) = tracking_channel();
        let mut ingestor = SampleIngestor::new(forward_walker(), GainPair::default(), queue);
        tx.push(DisplacementSample::new(1, Vec3::new(0.0, 0.0, 90.0)));
        tx.push(DisplacementSample::new(2, Vec3::new(1.0, 0.0, 0.0)));
        let mut cam = FlyCamera::default();
        ingestor.tick(0.0, &mut cam, &NullInput::default(), &mut MemorySampleSink::default());

        let p = cam.position();
        assert!((p.x - 1.0).abs() < 1e-5, "x = {}", p.x);
        assert!(p.z.abs() < 1e-5, "z = {}", p.z);
        assert!((cam.yaw() - 90.0).abs() < 1e-4);
    }

    #[test]
    fn log_uses_pose_from_before_the_drain() {
        let (tx, queue) = tracking_channel();
        let mut ingestor = SampleIngestor::new(forward_walker(), GainPair::default(), queue);
        tx.push(DisplacementSample::new(1, Vec3::new(1.0, 0.0, 10.0)));
        tx.push(DisplacementSample::new(2, Vec3::new(1.0, 0.0, 10.0)));
        let mut cam = FlyCamera::new(Vec3::new(3.0, 0.2, 4.0), 0.0);
        let sink = MemorySampleSink::default();
        ingestor.tick(0.0, &mut cam, &NullInput::default(), &mut sink.clone());

        let records = sink.records();
        assert_eq!(records.len(), 2);
        for r in &records {
            assert_eq!((r.camera_x, r.camera_z, r.camera_yaw), (3.0, 4.0, 0.0));
        }
        assert_eq!((records[0].rx, records[0].rz), (1.0, 10.0));
    }

    #[test]
    fn height_is_clamped_and_keys_move_locally() {
        let (_tx, queue) = tracking_channel();
        let mut ingestor = SampleIngestor::new(CoordinateTransform::default(), GainPair::default(), queue);
        let mut cam = FlyCamera::new(Vec3::new(0.0, 7.0, 0.0), 0.0);
        let mut input = ScriptedInput::default();
        input.press(Key::W);
        input.press(Key::D);

        ingestor.tick(0.1, &mut cam, &input, &mut MemorySampleSink::default());
        let p = cam.position();
        assert_eq!(p.y, CAMERA_HEIGHT);
        assert!((p.x - 5.0).abs() < 1e-4);
        assert!((p.z - 5.0).abs() < 1e-4);
    }

    #[test]
    fn vertical_mapping_never_changes_height() {
        let (tx, queue) = tracking_channel();
        let lift = CoordinateTransform {
            to_arena_xyz: Mat3::IDENTITY,
            to_arena_yaw: Vec3::ZERO,
        };
        let mut ingestor = SampleIngestor::new(lift, GainPair::default(), queue);
        let mut cam = FlyCamera::default();
        for tick in 0..5 {
            tx.push(DisplacementSample::new(tick, Vec3::new(0.1, 3.0, -0.2)));
            ingestor.tick(0.01, &mut cam, &NullInput::default(), &mut MemorySampleSink::default());
            assert_eq!(cam.position().y, CAMERA_HEIGHT);
        }
        assert!((cam.position().x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn empty_queue_only_clamps() {
        let (_tx, queue) = tracking_channel();
        let mut ingestor = SampleIngestor::new(forward_walker(), GainPair::default(), queue);
        let mut cam = FlyCamera::new(Vec3::new(1.0, -3.0, 2.0), 45.0);
        let sink = MemorySampleSink::default();
        let n = ingestor.tick(0.5, &mut cam, &NullInput::default(), &mut sink.clone());
        assert_eq!(n, 0);
        assert!(sink.records().is_empty());
        assert_eq!(cam.pose().position, Vec3::new(1.0, CAMERA_HEIGHT, 2.0));
        assert_eq!(cam.yaw(), 45.0);
    }
}
