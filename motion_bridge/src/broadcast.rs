//! Camera pose broadcast for VR monitoring.

use bytes::Bytes;
use motion_shared::{
    camera::CameraRig,
    net::{Delivery, PeerNetwork, PoseMessage, POSE_MESSAGE_ID},
};

/// Sends the camera's planar pose to every peer once per frame.
#[derive(Debug, Default)]
pub struct PoseBroadcaster {
    sent: u64,
}

impl PoseBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames broadcast so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Broadcasts the current pose. Returns `false` when no peer is
    /// connected and nothing was sent.
    pub fn end_frame(&mut self, camera: &dyn CameraRig, network: &mut dyn PeerNetwork) -> bool {
        if network.peer_count() == 0 {
            return false;
        }
        let pose = camera.pose();
        let msg = PoseMessage {
            x: pose.position.x,
            z: pose.position.z,
            yaw: pose.yaw,
        };
        network.broadcast(POSE_MESSAGE_ID, Delivery::UNRELIABLE, Bytes::from(msg.to_text()));
        self.sent += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion_shared::{camera::FlyCamera, math::Vec3, net::RecordingNetwork};

    #[test]
    fn no_peers_means_no_sends() {
        let mut net = RecordingNetwork::default();
        let mut b = PoseBroadcaster::new();
        assert!(!b.end_frame(&FlyCamera::default(), &mut net));
        assert!(net.sent().is_empty());
        assert_eq!(b.sent(), 0);
    }

    #[test]
    fn pose_goes_out_unreliable_on_channel_654() {
        let mut net = RecordingNetwork::with_peers(2);
        let cam = FlyCamera::new(Vec3::new(1.5, 9.0, -2.25), 90.0);
        let mut b = PoseBroadcaster::new();
        assert!(b.end_frame(&cam, &mut net));

        let sent = net.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].msg_id, 654);
        assert_eq!(sent[0].delivery, Delivery::UNRELIABLE);
        assert_eq!(&sent[0].payload[..], b"P1.5, -2.25, 90\n");
    }
}
