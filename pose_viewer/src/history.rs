//! Pose interpolation.
//!
//! The bridge broadcasts once per rendered frame. A viewer displays at its
//! own rate and interpolates between the two newest poses.

use std::collections::VecDeque;

use motion_shared::{
    math::{wrap_degrees, Vec3},
    net::PoseMessage,
};

/// Bounded history of received poses.
#[derive(Debug)]
pub struct PoseHistory {
    history: VecDeque<PoseMessage>,
    max: usize,
}

impl PoseHistory {
    pub fn new(max: usize) -> Self {
        Self {
            history: VecDeque::new(),
            max: max.max(2),
        }
    }

    pub fn push(&mut self, pose: PoseMessage) {
        self.history.push_back(pose);
        while self.history.len() > self.max {
            self.history.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn latest(&self) -> Option<&PoseMessage> {
        self.history.back()
    }

    /// Interpolated pose between the two newest entries.
    ///
    /// `alpha` in $[0,1]$: 0 = older, 1 = newer. Yaw takes the shortest arc.
    pub fn interp(&self, alpha: f32) -> Option<PoseMessage> {
        if self.history.len() < 2 {
            return None;
        }
        let a = self.history[self.history.len() - 2];
        let b = self.history[self.history.len() - 1];
        let alpha = alpha.clamp(0.0, 1.0);

        let p = Vec3::new(a.x, 0.0, a.z).lerp(Vec3::new(b.x, 0.0, b.z), alpha);
        let turn = wrap_degrees(b.yaw - a.yaw);
        Some(PoseMessage {
            x: p.x,
            z: p.z,
            yaw: wrap_degrees(a.yaw + turn * alpha),
        })
    }

    /// Planar distance covered across the buffered history.
    pub fn path_length(&self) -> f32 {
        self.history
            .iter()
            .zip(self.history.iter().skip(1))
            .map(|(a, b)| Vec3::new(b.x - a.x, 0.0, b.z - a.z).len_sq().sqrt())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(x: f32, z: f32, yaw: f32) -> PoseMessage {
        PoseMessage { x, z, yaw }
    }

    #[test]
    fn history_is_bounded() {
        let mut h = PoseHistory::new(3);
        for i in 0..5 {
            h.push(pose(i as f32, 0.0, 0.0));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.latest().map(|p| p.x), Some(4.0));
        assert_eq!(h.path_length(), 2.0);
    }

    #[test]
    fn interp_needs_two_poses() {
        let mut h = PoseHistory::new(4);
        assert!(h.interp(0.5).is_none());
        h.push(pose(0.0, 0.0, 0.0));
        assert!(h.interp(0.5).is_none());
    }

    #[test]
    fn yaw_interpolates_across_the_seam() {
        let mut h = PoseHistory::new(4);
        h.push(pose(0.0, 0.0, 170.0));
        h.push(pose(2.0, -4.0, -170.0));
        let mid = h.interp(0.5).unwrap();
        assert_eq!((mid.x, mid.z), (1.0, -2.0));
        assert!((mid.yaw.abs() - 180.0).abs() < 1e-3, "yaw = {}", mid.yaw);
    }
}
