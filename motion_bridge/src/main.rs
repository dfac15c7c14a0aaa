//! Standalone bridge binary.
//!
//! Usage:
//!   cargo run -p motion_bridge -- [--config vr.json] [--arena arena.json]
//!       [--addr 0.0.0.0:2345] [--sample-log samples.log] [--synthetic] [--frames N]
//!
//! Runs the motion bridge on a headless host, serves camera poses to viewers
//! and, with `--synthetic`, feeds it from a simulated ball tracker.
//!
//! Console commands:
//!   reset  - Return the camera to its home pose
//!   mouse  - Toggle mouse visibility/grab
//!   quit   - Raise the exit flag

use std::env;
use std::io::{BufRead, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use motion_bridge::{BridgeServices, HeadlessHost, MotionBridge, PoseServer};
use motion_shared::{
    camera::FlyCamera,
    config::BridgeConfig,
    host::ExitSignal,
    input::{Key, NullInput},
    sample::tracking_channel,
    sample_log::{FileSampleSink, SinkSet, TracingSampleSink},
    tracker::{SyntheticConfig, SyntheticTracker},
    transform::CoordinateTransform,
};
use tokio::sync::mpsc;
use tracing::info;

struct Args {
    config: Option<PathBuf>,
    arena: PathBuf,
    addr: Option<String>,
    sample_log: Option<String>,
    synthetic: bool,
    frames: Option<u64>,
}

fn parse_args() -> Args {
    let mut out = Args {
        config: None,
        arena: PathBuf::from("arena.json"),
        addr: None,
        sample_log: None,
        synthetic: false,
        frames: None,
    };
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                out.config = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--arena" if i + 1 < args.len() => {
                out.arena = PathBuf::from(&args[i + 1]);
                i += 2;
            }
            "--addr" if i + 1 < args.len() => {
                out.addr = Some(args[i + 1].clone());
                i += 2;
            }
            "--sample-log" if i + 1 < args.len() => {
                out.sample_log = Some(args[i + 1].clone());
                i += 2;
            }
            "--frames" if i + 1 < args.len() => {
                out.frames = args[i + 1].parse().ok();
                i += 2;
            }
            "--synthetic" => {
                out.synthetic = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    out
}

fn spawn_console(exit: ExitSignal, keys: mpsc::UnboundedSender<Key>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("] ");
            let _ = stdout.flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let sent = match line.trim() {
                "quit" | "exit" => {
                    exit.set(1);
                    break;
                }
                "reset" => keys.send(Key::R),
                "mouse" => keys.send(Key::Tab),
                "" => Ok(()),
                other => {
                    println!("Unknown command: {other}");
                    Ok(())
                }
            };
            if sent.is_err() {
                break;
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args();
    let mut cfg = match &args.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(addr) = &args.addr {
        cfg.network.listen_addr = addr.clone();
    }
    if args.sample_log.is_some() {
        cfg.logging.sample_log = args.sample_log.clone();
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cfg.logging.filter.as_str().into()),
        )
        .init();

    info!(
        full_screen = cfg.engine.full_screen,
        width = cfg.engine.window_width,
        height = cfg.engine.window_height,
        min_fps = cfg.engine.min_fps,
        max_fps = cfg.engine.max_fps,
        "Engine parameters"
    );

    let (tracking_tx, tracking_queue) = tracking_channel();
    let exit = ExitSignal::new();

    let addr: SocketAddr = cfg
        .network
        .listen_addr
        .parse()
        .context("parse network.listen_addr")?;
    let server = PoseServer::bind(addr).await.context("start pose server")?;
    let hub = server.hub();
    let mut host = HeadlessHost::new(&cfg.engine).with_server(server);

    let mut samples = SinkSet::default().with(TracingSampleSink);
    if let Some(path) = &cfg.logging.sample_log {
        samples = samples.with(FileSampleSink::create(Path::new(path))?);
    }

    let mut bridge = MotionBridge::configure(&args.arena, exit.clone(), tracking_queue)
        .start(
            CoordinateTransform::from(&cfg.transforms),
            BridgeServices {
                camera: Box::new(FlyCamera::default()),
                input: Box::new(NullInput::default()),
                network: Box::new(hub),
                engine: Box::new(host.engine_control()),
                samples: Box::new(samples),
            },
        )
        .context("start bridge")?;

    let tracker = args
        .synthetic
        .then(|| SyntheticTracker::spawn(tracking_tx.clone(), SyntheticConfig::default()));

    spawn_console(exit, host.key_sender());
    println!("Bridge running. Type 'reset', 'mouse' or 'quit'.");

    host.run(&mut bridge, args.frames).await;

    if let Some(tracker) = tracker {
        tracker.stop();
    }
    let pose = bridge.camera().pose();
    info!(
        ticks = bridge.ticks(),
        poses_sent = bridge.poses_sent(),
        x = pose.position.x,
        z = pose.position.z,
        yaw = pose.yaw,
        "Bridge stopped"
    );
    Ok(())
}
