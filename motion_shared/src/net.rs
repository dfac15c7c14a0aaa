//! Networking primitives.
//!
//! Goals:
//! - Describe the peer transport the bridge broadcasts through ([`PeerNetwork`]).
//! - Define the pose text message viewers consume.
//! - Keep the frame layout explicit: `[u32 msg_id][u8 flags][u32 len][payload]`,
//!   big-endian.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    },
};

use anyhow::Context;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

/// Message id of broadcast camera poses.
pub const POSE_MESSAGE_ID: u32 = 654;

/// Message id of the scene assignment sent to each new peer.
pub const SCENE_ASSIGN_MESSAGE_ID: u32 = 1;

/// One-character tag that starts every pose record.
pub const POSE_TAG: char = 'P';

/// Frame header size: id, flags, length.
pub const FRAME_HEADER_LEN: usize = 4 + 1 + 4;

/// Largest payload a peer will accept.
pub const MAX_FRAME_PAYLOAD: usize = 64 * 1024;

static NEXT_PEER_ID: AtomicU32 = AtomicU32::new(1);

/// Identifies a connected peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(pub u32);

impl PeerId {
    pub fn new_unique() -> Self {
        PeerId(NEXT_PEER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

bitflags::bitflags! {
    /// Delivery guarantees requested for a message.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Delivery: u8 {
        const RELIABLE = 1 << 0;
        const IN_ORDER = 1 << 1;
    }
}

impl Delivery {
    /// Fire-and-forget: no acknowledgment, no ordering.
    pub const UNRELIABLE: Self = Self::empty();
}

/// One transport frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub msg_id: u32,
    pub delivery: Delivery,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(msg_id: u32, delivery: Delivery, payload: impl Into<Bytes>) -> Self {
        Self {
            msg_id,
            delivery,
            payload: payload.into(),
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + self.payload.len());
        buf.put_u32(self.msg_id);
        buf.put_u8(self.delivery.bits());
        buf.put_u32(self.payload.len() as u32);
        buf.extend_from_slice(&self.payload);
        buf.freeze()
    }

    /// Parses a header, returning `(msg_id, delivery, payload_len)`.
    pub fn decode_header(header: &[u8]) -> anyhow::Result<(u32, Delivery, usize)> {
        anyhow::ensure!(header.len() >= FRAME_HEADER_LEN, "short frame header");
        let mut b = header;
        let msg_id = b.get_u32();
        let delivery = Delivery::from_bits_truncate(b.get_u8());
        let len = b.get_u32() as usize;
        anyhow::ensure!(len <= MAX_FRAME_PAYLOAD, "frame payload too large: {len}");
        Ok((msg_id, delivery, len))
    }

    pub fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        let (msg_id, delivery, len) = Self::decode_header(bytes)?;
        let body = &bytes[FRAME_HEADER_LEN..];
        anyhow::ensure!(body.len() == len, "frame length mismatch: {} != {len}", body.len());
        Ok(Self::new(msg_id, delivery, Bytes::copy_from_slice(body)))
    }
}

/// Planar camera pose as broadcast to viewers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PoseMessage {
    pub x: f32,
    pub z: f32,
    /// Degrees.
    pub yaw: f32,
}

impl PoseMessage {
    /// Renders `P<x>, <z>, <yaw>\n`, each field to six significant digits.
    pub fn to_text(&self) -> String {
        format!(
            "{POSE_TAG}{}, {}, {}\n",
            format_general(self.x),
            format_general(self.z),
            format_general(self.yaw)
        )
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let body = text
            .strip_prefix(POSE_TAG)
            .context("pose record missing tag")?
            .trim_end_matches(['\n', '\0']);
        let mut fields = body.split(',').map(str::trim);
        let mut next = |name: &str| -> anyhow::Result<f32> {
            fields
                .next()
                .with_context(|| format!("pose record missing {name}"))?
                .parse::<f32>()
                .with_context(|| format!("pose record has bad {name}"))
        };
        let msg = Self {
            x: next("x")?,
            z: next("z")?,
            yaw: next("yaw")?,
        };
        anyhow::ensure!(fields.next().is_none(), "pose record has trailing fields");
        Ok(msg)
    }

    pub fn to_frame(&self) -> Frame {
        Frame::new(POSE_MESSAGE_ID, Delivery::UNRELIABLE, self.to_text())
    }
}

/// Significant digits in a pose field.
const POSE_DIGITS: i32 = 6;

/// Formats like C's `%g`: fixed notation for exponents in `-4..6`,
/// scientific otherwise, trailing zeros removed.
fn format_general(value: f32) -> String {
    if value == 0.0 || !value.is_finite() {
        return value.to_string();
    }
    let value = f64::from(value);
    // Exponent after rounding to the target precision.
    let sci = format!("{:.*e}", (POSE_DIGITS - 1) as usize, value);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return sci;
    };
    if (-4..POSE_DIGITS).contains(&exp) {
        let decimals = (POSE_DIGITS - 1 - exp) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.abs())
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Host peer transport.
pub trait PeerNetwork: Send {
    fn peer_count(&self) -> usize;

    /// Sends to every connected peer. Individual peer failures are not
    /// reported.
    fn broadcast(&mut self, msg_id: u32, delivery: Delivery, payload: Bytes);

    /// Grants a peer read access to the named scene for replication.
    fn assign_scene(&mut self, peer: PeerId, scene: &str);
}

/// Network with no peers.
#[derive(Debug, Default)]
pub struct NullNetwork;

impl PeerNetwork for NullNetwork {
    fn peer_count(&self) -> usize {
        0
    }

    fn broadcast(&mut self, _msg_id: u32, _delivery: Delivery, _payload: Bytes) {}

    fn assign_scene(&mut self, _peer: PeerId, _scene: &str) {}
}

/// In-memory network that records what was sent. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RecordingNetwork {
    inner: Arc<Mutex<RecordingState>>,
}

#[derive(Debug, Default)]
struct RecordingState {
    peers: usize,
    sent: Vec<Frame>,
    assigned: Vec<(PeerId, String)>,
}

impl RecordingNetwork {
    pub fn with_peers(peers: usize) -> Self {
        let net = Self::default();
        net.set_peers(peers);
        net
    }

    fn state(&self) -> std::sync::MutexGuard<'_, RecordingState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_peers(&self, peers: usize) {
        self.state().peers = peers;
    }

    pub fn sent(&self) -> Vec<Frame> {
        self.state().sent.clone()
    }

    pub fn assigned(&self) -> Vec<(PeerId, String)> {
        self.state().assigned.clone()
    }
}

impl PeerNetwork for RecordingNetwork {
    fn peer_count(&self) -> usize {
        self.state().peers
    }

    fn broadcast(&mut self, msg_id: u32, delivery: Delivery, payload: Bytes) {
        self.state().sent.push(Frame::new(msg_id, delivery, payload));
    }

    fn assign_scene(&mut self, peer: PeerId, scene: &str) {
        self.state().assigned.push((peer, scene.to_string()));
    }
}
