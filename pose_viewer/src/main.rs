//! Standalone viewer binary.
//!
//! Usage:
//!   cargo run -p pose_viewer -- [--addr 127.0.0.1:2345] [--count N]
//!
//! Connects to a running bridge and prints every camera pose it broadcasts.

use std::env;
use std::net::SocketAddr;

use anyhow::Context;
use motion_shared::config::DEFAULT_POSE_PORT;
use pose_viewer::{PoseViewer, ViewerEvent};
use tracing::info;

fn parse_args() -> (String, Option<u64>) {
    let mut addr = format!("127.0.0.1:{DEFAULT_POSE_PORT}");
    let mut count = None;
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                addr = args[i + 1].clone();
                i += 2;
            }
            "--count" if i + 1 < args.len() => {
                count = args[i + 1].parse().ok();
                i += 2;
            }
            _ => i += 1,
        }
    }
    (addr, count)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let (addr, count) = parse_args();
    let addr: SocketAddr = addr.parse().context("parse --addr")?;
    let mut viewer = PoseViewer::connect(addr).await.context("connect")?;

    let mut poses = 0u64;
    loop {
        match viewer.recv_event().await? {
            ViewerEvent::SceneAssigned(scene) => println!("scene {scene}"),
            ViewerEvent::Pose(pose) => {
                println!("x={:>9.3} z={:>9.3} yaw={:>8.2}", pose.x, pose.z, pose.yaw);
                poses += 1;
                if count.is_some_and(|n| poses >= n) {
                    break;
                }
            }
            ViewerEvent::Other { .. } => {}
        }
    }

    info!(
        poses,
        frames = viewer.received(),
        path = viewer.poses.path_length(),
        "Viewer done"
    );
    Ok(())
}
