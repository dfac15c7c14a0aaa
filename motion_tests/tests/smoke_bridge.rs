use motion_bridge::{HeadlessHost, PoseServer};
use motion_shared::{config::EngineParams, host::FrameHandler};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

struct Idle;

impl FrameHandler for Idle {
    fn update(&mut self, _dt_sec: f32) {}
}

/// Smoke test: host with a live server runs a few frames without panicking.
#[tokio::test]
async fn host_runs_few_frames() -> anyhow::Result<()> {
    let server = PoseServer::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)).await?;
    let mut host = HeadlessHost::new(&EngineParams::default()).with_server(server);
    assert_eq!(host.run(&mut Idle, Some(3)).await, 3);
    assert_eq!(host.server().map(|s| s.peer_count()), Some(0));
    Ok(())
}
