//! Viewer connection.
//!
//! A viewer keeps one TCP stream to the bridge's pose server and reads
//! frames off it:
//! - the scene assignment, always the first frame
//! - one pose record per bridge frame

use std::net::SocketAddr;

use anyhow::Context;
use bytes::Bytes;
use motion_shared::net::{
    Frame, PoseMessage, FRAME_HEADER_LEN, POSE_MESSAGE_ID, SCENE_ASSIGN_MESSAGE_ID,
};
use tokio::{io::AsyncReadExt, net::TcpStream};
use tracing::{debug, info};

use crate::history::PoseHistory;

/// Poses kept for interpolation.
pub const HISTORY_LEN: usize = 32;

/// Something the bridge sent.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    SceneAssigned(String),
    Pose(PoseMessage),
    /// Frame with an id this viewer does not handle.
    Other { msg_id: u32 },
}

/// Connected viewer.
pub struct PoseViewer {
    stream: TcpStream,
    pub scene: Option<String>,
    pub poses: PoseHistory,
    received: u64,
}

impl PoseViewer {
    pub async fn connect(addr: SocketAddr) -> anyhow::Result<Self> {
        info!(server = %addr, "Connecting to pose server");
        let stream = TcpStream::connect(addr).await.context("tcp connect")?;
        stream.set_nodelay(true).context("set_nodelay")?;
        Ok(Self {
            stream,
            scene: None,
            poses: PoseHistory::new(HISTORY_LEN),
            received: 0,
        })
    }

    /// Frames received so far.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Reads one whole frame.
    pub async fn recv_frame(&mut self) -> anyhow::Result<Frame> {
        let mut header = [0u8; FRAME_HEADER_LEN];
        self.stream
            .read_exact(&mut header)
            .await
            .context("tcp read header")?;
        let (msg_id, delivery, len) = Frame::decode_header(&header)?;
        let mut payload = vec![0u8; len];
        self.stream
            .read_exact(&mut payload)
            .await
            .context("tcp read payload")?;
        self.received += 1;
        Ok(Frame::new(msg_id, delivery, Bytes::from(payload)))
    }

    /// Reads one frame and applies it to the viewer state.
    pub async fn recv_event(&mut self) -> anyhow::Result<ViewerEvent> {
        let frame = self.recv_frame().await?;
        let text = || std::str::from_utf8(&frame.payload).context("payload is not utf-8");
        match frame.msg_id {
            SCENE_ASSIGN_MESSAGE_ID => {
                let scene = text()?.to_string();
                info!(%scene, "Scene assigned");
                self.scene = Some(scene.clone());
                Ok(ViewerEvent::SceneAssigned(scene))
            }
            POSE_MESSAGE_ID => {
                let pose = PoseMessage::parse(text()?)?;
                self.poses.push(pose);
                Ok(ViewerEvent::Pose(pose))
            }
            msg_id => {
                debug!(msg_id, "Ignoring frame");
                Ok(ViewerEvent::Other { msg_id })
            }
        }
    }

    /// Reads until the next pose arrives.
    pub async fn recv_pose(&mut self) -> anyhow::Result<PoseMessage> {
        loop {
            if let ViewerEvent::Pose(pose) = self.recv_event().await? {
                return Ok(pose);
            }
        }
    }
}
