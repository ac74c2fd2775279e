//! # VECTREK Server
//!
//! The headless authoritative server: owns the real ship, applies pilot
//! input arriving from the client, and broadcasts the ship's state every
//! sync period.
//!
//! ## Usage
//!
//! ```bash
//! vectrek_server --config vectrek.toml --bind 127.0.0.1:7777 --peer 127.0.0.1:7778 --duration 30
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use vectrek_core::{Helm, Motion, Position, SyncSender, World};
use vectrek_networking::{telemetry, GameConfig, LossyLink, Session, UdpLink};

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
                println!("Usage: vectrek_server [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <FILE>        TOML configuration file");
                println!("  -b, --bind <ADDR>          Listen address (default: net.server_addr)");
                println!("  -p, --peer <ADDR>          Client address (default: net.client_addr)");
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

fn main() -> ExitCode {
    let Some(args) = parse_args() else {
        return ExitCode::SUCCESS;
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("vectrek_server: {err}");
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

    let bind = args.bind.unwrap_or(config.net.server_addr);
    let peer = args.peer.unwrap_or(config.net.client_addr);

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         VECTREK SERVER                                           ║");
    println!("║         THE AUTHORITATIVE SHIP                                   ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();
    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Bind Address:       {bind}");
    println!("│ Client Address:     {peer}");
    println!("│ Tick Rate:          {} Hz", config.net.tick_rate);
    println!("│ Sync Period:        {} ticks", config.world.sync_period);
    match args.duration_secs {
        Some(d) => println!("│ Duration:           {d} seconds"),
        None => println!("│ Duration:           infinite"),
    }
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let link = UdpLink::bind(bind)?;
    let (udp_tx, udp_rx, reader) = link.split(peer, config.net.queue_capacity)?;

    let mut world = World::new("server", config.world.clone());
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
            SyncSender::default().into(),
        ],
    )?;

    let session = Session::spawn(world, config.net.tick_rate)?;
    let shared = session.world();

    let start = Instant::now();
    let status_interval = Duration::from_secs(5);
    let mut next_status = status_interval;
    loop {
        std::thread::sleep(Duration::from_millis(100));
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

        if elapsed >= next_status {
            next_status += status_interval;
            let world = shared.lock();
            let position = world.component::<Position>(ship).copied().unwrap_or_default();
            let motion = world.component::<Motion>(ship).copied().unwrap_or_default();
            let sent = world
                .component::<SyncSender>(ship)
                .map_or(0, SyncSender::sent);

            println!("┌─ SERVER STATUS (Tick {}) ──────────────────────────", world.tick());
            println!("│ Uptime:             {:.1}s", elapsed.as_secs_f64());
            println!("│ Position:           ({:.1}, {:.1})", position.vector.x, position.vector.y);
            println!("│ Velocity:           ({:.2}, {:.2})", motion.velocity.x, motion.velocity.y);
            println!("│ Heading:            {:.1} rad", position.angle.radians());
            println!("│ States Sent:        {sent}");
            println!("│ Dropped Inbound:    {}", world.undeliverable());
            println!("└──────────────────────────────────────────────────────────────────");
            println!();
        }
    }

    let stats = session.stop().unwrap_or_default();
    let transport = reader.stop();

    println!();
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                    SERVER SHUTDOWN                               ║");
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║ Total Ticks:        {:>10}", stats.total_ticks);
    println!("║ Avg Tick Time:      {:>10} μs", stats.avg_tick_us);
    println!("║ Max Tick Time:      {:>10} μs", stats.max_tick_us);
    println!("║ Late Ticks:         {:>10}", stats.late_ticks);
    println!("║ Packets Sent:       {:>10}", transport.packets_sent);
    println!("║ Packets Received:   {:>10}", transport.packets_received);
    println!("╚══════════════════════════════════════════════════════════════════╝");

    Ok(())
}
