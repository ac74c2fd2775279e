//! # VECTREK Client
//!
//! Headless predicting client. Flies its own copy of the ship from a scripted
//! input pattern, sends that input to the server, and steers its prediction
//! back towards every authoritative state the server broadcasts.
//!
//! ## Usage
//!
//! ```bash
//! vectrek_client --config vectrek.toml --bind 127.0.0.1:7778 --peer 127.0.0.1:7777 --duration 30
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use vectrek_core::{Helm, Motion, Player, Position, Sprite, SyncReceiver, World};
use vectrek_networking::{telemetry, GameConfig, LossyLink, Session, UdpLink};
use vectrek_shared::HelmInput;

#[derive(Default)]
struct Args {
    config: Option<PathBuf>,
    bind: Option<SocketAddr>,
    peer: Option<SocketAddr>,
    duration_secs: Option<u64>,
}

fn parse_args() -> Option<Args> {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--config" | "-c" => {
                parsed.config = value.map(PathBuf::from);
                i += 1;
            }
            "--bind" | "-b" => {
                parsed.bind = value.and_then(|v| v.parse().ok());
                i += 1;
            }
            "--peer" | "-p" => {
                parsed.peer = value.and_then(|v| v.parse().ok());
                i += 1;
            }
            "--duration" | "-d" => {
                parsed.duration_secs = value.and_then(|v| v.parse().ok());
                i += 1;
            }
            "--help" | "-h" => {
                println!("Usage: vectrek_client [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <FILE>        TOML configuration file");
                println!("  -b, --bind <ADDR>          Listen address (default: net.client_addr)");
                println!("  -p, --peer <ADDR>          Server address (default: net.server_addr)");
                println!("  -d, --duration <SECS>      Run for N seconds then exit");
                println!("  -h, --help                 Show this help");
                return None;
            }
            other => eprintln!("ignoring unknown argument: {other}"),
        }
        i += 1;
    }

    Some(parsed)
}

/// Stand-in for a keyboard: a repeating eight-second flight pattern.
fn scripted_input(elapsed: Duration) -> HelmInput {
    let phase = elapsed.as_millis() % 8_000;
    HelmInput {
        left: (5_000..6_000).contains(&phase),
        right: (2_000..3_000).contains(&phase),
        thrust: phase < 1_500 || (3_000..3_500).contains(&phase),
    }
}

fn main() -> ExitCode {
    let Some(args) = parse_args() else {
        return ExitCode::SUCCESS;
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("vectrek_client: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    telemetry::init(&config.log_level);

    let bind = args.bind.unwrap_or(config.net.client_addr);
    let peer = args.peer.unwrap_or(config.net.server_addr);

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         VECTREK CLIENT                                           ║");
    println!("║         THE PREDICTED SHIP                                       ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();
    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Bind Address:       {bind}");
    println!("│ Server Address:     {peer}");
    println!("│ Tick Rate:          {} Hz", config.net.tick_rate);
    println!("│ Inbox Capacity:     {}", config.world.inbox_capacity);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let link = UdpLink::bind(bind)?;
    let (udp_tx, udp_rx, reader) = link.split(peer, config.net.queue_capacity)?;

    let mut world = World::new("client", config.world.clone());
    world.set_sender(LossyLink::new(udp_tx, config.simulation));
    world.set_receiver(udp_rx);

    let ship = world.allocate_entity()?;
    let center = world.config().arena.center();
    world.add_entity(
        ship,
        vec![
            Position::at(center.x, center.y).into(),
            Motion::default().into(),
            Helm::default().into(),
            Player::default().into(),
            SyncReceiver::default().into(),
            Sprite::default().into(),
        ],
    )?;

    let session = Session::spawn(world, config.net.tick_rate)?;
    let shared = session.world();

    let start = Instant::now();
    let status_interval = Duration::from_secs(2);
    let mut next_status = status_interval;
    loop {
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = start.elapsed();

        if args
            .duration_secs
            .is_some_and(|limit| elapsed.as_secs() >= limit)
        {
            break;
        }
        if !session.is_running() {
            break;
        }

        let mut world = shared.lock();
        world.steer(ship, scripted_input(elapsed))?;

        if elapsed >= next_status {
            next_status += status_interval;
            let position = world.component::<Position>(ship).copied().unwrap_or_default();
            let motion = world.component::<Motion>(ship).copied().unwrap_or_default();
            let (applied, dropped) = world
                .component::<SyncReceiver>(ship)
                .map_or((0, 0), |r| (r.applied(), r.dropped()));

            println!("┌─ CLIENT STATUS (Tick {}) ──────────────────────────", world.tick());
            println!("│ Position:           ({:.1}, {:.1})", position.vector.x, position.vector.y);
            println!("│ Velocity:           ({:.2}, {:.2})", motion.velocity.x, motion.velocity.y);
            println!("│ States Applied:     {applied}");
            println!("│ States Dropped:     {dropped}");
            for outline in world.ship_outlines() {
                let [nose, right, left] = outline.vertices;
                println!(
                    "│ Ship {}:            ({:.0},{:.0}) ({:.0},{:.0}) ({:.0},{:.0})",
                    outline.entity, nose.x, nose.y, right.x, right.y, left.x, left.y
                );
            }
            println!("└──────────────────────────────────────────────────────────────────");
            println!();
        }
    }

    let stats = session.stop().unwrap_or_default();
    let transport = reader.stop();

    println!();
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                    CLIENT SHUTDOWN                               ║");
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║ Total Ticks:        {:>10}", stats.total_ticks);
    println!("║ Late Ticks:         {:>10}", stats.late_ticks);
    println!("║ Packets Sent:       {:>10}", transport.packets_sent);
    println!("║ Packets Received:   {:>10}", transport.packets_received);
    println!("║ Decode Errors:      {:>10}", transport.decode_errors);
    println!("╚══════════════════════════════════════════════════════════════════╝");

    Ok(())
}
