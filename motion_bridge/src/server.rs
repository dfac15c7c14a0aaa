//! TCP pose server.
//!
//! Viewers connect over TCP and receive length-prefixed frames. The
//! simulation thread never waits on a socket: each peer has a bounded
//! outbound queue served by its own task, and unreliable frames for a peer
//! whose queue is full are dropped. A peer receives broadcasts only after
//! its scene has been assigned, so the assignment is always its first frame.
//!
//! - [`PoseServer`] owns the listener and reports new connections.
//! - [`PeerHub`] is the cloneable [`PeerNetwork`] handle the bridge sends
//!   through.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::Context;
use bytes::Bytes;
use motion_shared::net::{Delivery, Frame, PeerId, PeerNetwork, SCENE_ASSIGN_MESSAGE_ID};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

/// Frames buffered per peer before unreliable sends start dropping.
pub const PEER_QUEUE_DEPTH: usize = 64;

struct PeerLink {
    addr: SocketAddr,
    tx: mpsc::Sender<Bytes>,
    dropped: u64,
    scene_assigned: bool,
}

type PeerTable = Arc<Mutex<HashMap<PeerId, PeerLink>>>;

fn lock(peers: &PeerTable) -> MutexGuard<'_, HashMap<PeerId, PeerLink>> {
    peers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Listening pose server.
pub struct PoseServer {
    local_addr: SocketAddr,
    peers: PeerTable,
    connected_rx: mpsc::UnboundedReceiver<PeerId>,
    accept_task: JoinHandle<()>,
}

impl PoseServer {
    /// Binds the listener and starts accepting viewers.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn bind(addr: SocketAddr) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await.context("tcp bind")?;
        let local_addr = listener.local_addr().context("tcp local addr")?;
        let peers: PeerTable = Arc::default();
        let (connected_tx, connected_rx) = mpsc::unbounded_channel();

        let accept_task = tokio::spawn(accept_loop(listener, peers.clone(), connected_tx));
        info!(%local_addr, "Pose server listening");

        Ok(Self {
            local_addr,
            peers,
            connected_rx,
            accept_task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns a handle the bridge broadcasts through.
    pub fn hub(&self) -> PeerHub {
        PeerHub {
            peers: self.peers.clone(),
        }
    }

    /// Drains connections accepted since the last call.
    pub fn poll_connections(&mut self) -> Vec<PeerId> {
        let mut out = Vec::new();
        while let Ok(peer) = self.connected_rx.try_recv() {
            out.push(peer);
        }
        out
    }

    pub fn peer_count(&self) -> usize {
        lock(&self.peers).len()
    }
}

impl Drop for PoseServer {
    fn drop(&mut self) {
        self.accept_task.abort();
        // Dropping the senders ends every peer task.
        lock(&self.peers).clear();
    }
}

async fn accept_loop(
    listener: TcpListener,
    peers: PeerTable,
    connected_tx: mpsc::UnboundedSender<PeerId>,
) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "tcp accept failed");
                continue;
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, %addr, "set_nodelay failed");
        }

        let peer = PeerId::new_unique();
        let (tx, rx) = mpsc::channel(PEER_QUEUE_DEPTH);
        lock(&peers).insert(
            peer,
            PeerLink {
                addr,
                tx,
                dropped: 0,
                scene_assigned: false,
            },
        );
        info!(%peer, %addr, "Viewer connected");
        tokio::spawn(serve_peer(peer, stream, rx, peers.clone()));

        if connected_tx.send(peer).is_err() {
            // Server handle dropped.
            break;
        }
    }
}

async fn serve_peer(peer: PeerId, stream: TcpStream, mut rx: mpsc::Receiver<Bytes>, peers: PeerTable) {
    let (mut rd, mut wr) = stream.into_split();
    let mut scratch = [0u8; 256];
    loop {
        tokio::select! {
            frame = rx.recv() => match frame {
                Some(bytes) => {
                    if let Err(e) = wr.write_all(&bytes).await {
                        debug!(%peer, error = %e, "Peer write failed");
                        break;
                    }
                }
                None => break,
            },
            read = rd.read(&mut scratch) => match read {
                // Viewers send nothing meaningful; only EOF matters.
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            },
        }
    }

    if let Some(link) = lock(&peers).remove(&peer) {
        info!(%peer, addr = %link.addr, dropped = link.dropped, "Viewer disconnected");
    }
}

/// Cloneable [`PeerNetwork`] over the server's peer table.
#[derive(Clone)]
pub struct PeerHub {
    peers: PeerTable,
}

impl PeerHub {
    fn send_to(link: &mut PeerLink, peer: PeerId, delivery: Delivery, frame: Bytes) -> bool {
        match link.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                link.dropped += 1;
                if delivery.contains(Delivery::RELIABLE) {
                    warn!(%peer, "Reliable frame dropped, peer queue full");
                }
                true
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

impl PeerNetwork for PeerHub {
    fn peer_count(&self) -> usize {
        lock(&self.peers).len()
    }

    fn broadcast(&mut self, msg_id: u32, delivery: Delivery, payload: Bytes) {
        let frame = Frame::new(msg_id, delivery, payload).encode();
        let mut peers = lock(&self.peers);
        peers.retain(|peer, link| {
            !link.scene_assigned || Self::send_to(link, *peer, delivery, frame.clone())
        });
    }

    fn assign_scene(&mut self, peer: PeerId, scene: &str) {
        let frame = Frame::new(
            SCENE_ASSIGN_MESSAGE_ID,
            Delivery::RELIABLE | Delivery::IN_ORDER,
            scene.to_string(),
        )
        .encode();
        let mut peers = lock(&self.peers);
        let Some(link) = peers.get_mut(&peer) else {
            debug!(%peer, "Scene assignment for unknown peer");
            return;
        };
        if Self::send_to(link, peer, Delivery::RELIABLE, frame) {
            link.scene_assigned = true;
        } else {
            peers.remove(&peer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion_shared::net::{POSE_MESSAGE_ID, FRAME_HEADER_LEN};
    use std::{
        net::{IpAddr, Ipv4Addr},
        time::Duration,
    };

    fn loopback() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    async fn wait_for_peer(server: &mut PoseServer) -> PeerId {
        for _ in 0..200 {
            if let Some(peer) = server.poll_connections().pop() {
                return peer;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no peer connected");
    }

    #[tokio::test]
    async fn broadcast_reaches_connected_viewer() -> anyhow::Result<()> {
        let mut server = PoseServer::bind(loopback()).await?;
        let mut hub = server.hub();
        assert_eq!(hub.peer_count(), 0);

        let mut client = TcpStream::connect(server.local_addr()).await?;
        let peer = wait_for_peer(&mut server).await;
        assert_eq!(hub.peer_count(), 1);

        hub.assign_scene(peer, "Arena");
        hub.broadcast(POSE_MESSAGE_ID, Delivery::UNRELIABLE, Bytes::from_static(b"P1, 2, 3\n"));

        for (id, body) in [(SCENE_ASSIGN_MESSAGE_ID, &b"Arena"[..]), (POSE_MESSAGE_ID, &b"P1, 2, 3\n"[..])] {
            let mut header = [0u8; FRAME_HEADER_LEN];
            client.read_exact(&mut header).await?;
            let (msg_id, _, len) = Frame::decode_header(&header)?;
            let mut payload = vec![0u8; len];
            client.read_exact(&mut payload).await?;
            assert_eq!(msg_id, id);
            assert_eq!(payload, body);
        }
        Ok(())
    }

    #[tokio::test]
    async fn poses_wait_for_scene_assignment() -> anyhow::Result<()> {
        let mut server = PoseServer::bind(loopback()).await?;
        let mut hub = server.hub();
        let mut client = TcpStream::connect(server.local_addr()).await?;
        let peer = wait_for_peer(&mut server).await;

        hub.broadcast(POSE_MESSAGE_ID, Delivery::UNRELIABLE, Bytes::from_static(b"P0, 0, 0\n"));
        hub.assign_scene(peer, "Lab");
        hub.broadcast(POSE_MESSAGE_ID, Delivery::UNRELIABLE, Bytes::from_static(b"P4, 5, 6\n"));

        let mut frames = Vec::new();
        for _ in 0..2 {
            let mut header = [0u8; FRAME_HEADER_LEN];
            client.read_exact(&mut header).await?;
            let (msg_id, _, len) = Frame::decode_header(&header)?;
            let mut payload = vec![0u8; len];
            client.read_exact(&mut payload).await?;
            frames.push((msg_id, payload));
        }
        assert_eq!(frames[0], (SCENE_ASSIGN_MESSAGE_ID, b"Lab".to_vec()));
        assert_eq!(frames[1], (POSE_MESSAGE_ID, b"P4, 5, 6\n".to_vec()));
        assert_eq!(hub.peer_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn disconnected_viewer_is_forgotten() -> anyhow::Result<()> {
        let mut server = PoseServer::bind(loopback()).await?;
        let client = TcpStream::connect(server.local_addr()).await?;
        wait_for_peer(&mut server).await;
        drop(client);

        for _ in 0..200 {
            if server.peer_count() == 0 {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        anyhow::bail!("peer was not removed after disconnect")
    }
}
