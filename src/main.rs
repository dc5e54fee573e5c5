//! stuck - headless demo host for the `/stuck` command.
//!
//! Builds a superflat world, buries a player in it, runs the command and
//! ticks the server until the teleport sequence settles.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use stuck::{parse_command, CommandSender, Dispatch, StuckConfig, StuckHandler, PERMISSION_NODE};
use stuck_core::{scoped_rng, DimensionId, Location, PlayerId, SimTick, TICKS_PER_SECOND};
use stuck_server::{
    Delivery, OnlinePlayer, Scheduler, Server, SystemClock, TeleportOutcome, TickScheduler,
};
use stuck_world::{ChunkPos, FlatSource, MaterialRegistry, VoxelWorld};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the /stuck command against a headless world", long_about = None)]
struct Args {
    /// Configuration file; created with defaults when missing
    #[arg(short, long, default_value = stuck::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Material definitions (JSON); built-in table when omitted
    #[arg(long)]
    materials: Option<PathBuf>,

    /// Command line as typed by the player
    #[arg(long, default_value = "/stuck")]
    command: String,

    /// Dispatch the command from the console instead of a player
    #[arg(long)]
    console: bool,

    /// Seed for the search RNG; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Upper bound on simulated ticks
    #[arg(long, default_value_t = 200)]
    ticks: u64,

    /// Material of the top layer
    #[arg(long, default_value = "GRASS_BLOCK")]
    ground: String,

    /// First air layer above the ground
    #[arg(long, default_value_t = 64, allow_hyphen_values = true)]
    surface_y: i32,

    /// Player name
    #[arg(long, default_value = "Steve")]
    name: String,

    /// Player position as x y z
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_hyphen_values = true,
          default_values_t = [0.5, 40.0, 0.5])]
    position: Vec<f64>,

    /// Write every delivery as JSON lines to this file
    #[arg(long)]
    transcript: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize tracing with INFO level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!("stuck v{} enabled thanks for using it!", env!("CARGO_PKG_VERSION"));

    let config = StuckConfig::load_from_path(&args.config);
    let rng = match args.seed {
        Some(seed) => scoped_rng(seed, SimTick::ZERO),
        None => StdRng::from_entropy(),
    };

    let materials = match &args.materials {
        Some(path) => MaterialRegistry::from_file(path)
            .with_context(|| format!("loading materials from {}", path.display()))?,
        None => MaterialRegistry::default(),
    };
    let spawn = match args.position[..] {
        [x, y, z] => Location::new(DimensionId::Overworld, x, y, z),
        _ => anyhow::bail!("--position takes exactly three values"),
    };

    let mut server = Server::new();
    server.add_world(demo_world(
        Arc::new(materials),
        &args.ground,
        args.surface_y,
        &spawn,
        config.search_radius,
    )?);
    let player = PlayerId::random();
    server.join(
        player,
        OnlinePlayer::new(&args.name, spawn).with_permission(PERMISSION_NODE),
    );

    let alias = parse_command(&args.command)?;
    let sender = if args.console {
        CommandSender::Console
    } else {
        CommandSender::Player(player)
    };
    let mut scheduler = TickScheduler::new();
    let mut handler = StuckHandler::new(config, SystemClock, rng);

    match handler.execute(alias, sender, &mut server, &mut scheduler) {
        Dispatch::PlayersOnly(reply) => println!("[console] {reply}"),
        Dispatch::Teleporting { target, .. } => info!("Teleport to {target} scheduled"),
        other => info!("Command finished without a teleport: {other:?}"),
    }

    while !scheduler.is_idle() && scheduler.now().0 < args.ticks {
        let due = scheduler.advance();
        for outcome in handler.on_tick(due, &mut server, &mut scheduler) {
            match outcome {
                TeleportOutcome::Completed { target, .. } => {
                    info!(tick = scheduler.now().0, "{} arrived at {target}", args.name)
                }
                TeleportOutcome::Failed { reason, .. } => {
                    error!(tick = scheduler.now().0, "teleport failed: {reason}")
                }
            }
        }
    }
    let elapsed = scheduler.now().since(SimTick::ZERO);
    info!(
        "Simulated {elapsed} ticks ({:.2}s of game time)",
        elapsed as f64 / TICKS_PER_SECOND as f64
    );
    if !scheduler.is_idle() {
        warn!(
            pending = scheduler.pending(),
            "tick budget of {} exhausted", args.ticks
        );
    }

    print_transcript(&server);
    if let Some(path) = &args.transcript {
        write_transcript(&server, path)?;
        info!("Transcript written to {}", path.display());
    }

    info!("stuck disabled.");
    Ok(())
}

fn demo_world(
    materials: Arc<MaterialRegistry>,
    ground: &str,
    surface_y: i32,
    spawn: &Location,
    search_radius: i32,
) -> Result<VoxelWorld> {
    let id = |name: &str| {
        materials
            .id_by_name(name)
            .with_context(|| format!("unknown material {name}"))
    };
    let bounds = DimensionId::Overworld.height_bounds();
    let depth = u32::try_from(surface_y - bounds.min)
        .ok()
        .filter(|depth| *depth >= 2)
        .with_context(|| format!("surface-y must be at least {}", bounds.min + 2))?;
    let source = FlatSource::new()
        .layer(id("BEDROCK")?, 1)
        .layer(id("STONE")?, depth - 2)
        .layer(id(ground)?, 1);

    let mut world = VoxelWorld::new("world", DimensionId::Overworld, materials, source);
    let (cx, cz) = spawn.chunk_coords();
    let radius = search_radius.max(0) / 16 + 1;
    world
        .load_area(ChunkPos::new(cx, cz), radius)
        .context("loading spawn area")?;
    Ok(world)
}

fn print_transcript(server: &Server) {
    for delivery in server.deliveries() {
        match delivery {
            Delivery::Message { player, message } => {
                println!("[chat] {}: {message}", player_label(server, *player))
            }
            Delivery::Title { title, .. } => {
                println!("[title] {} / {}", title.title, title.subtitle)
            }
            Delivery::Sound { at, cue } => println!("[sound] {:?} at {at}", cue.sound),
            Delivery::Particles { at, burst } => {
                println!("[particles] {}x {:?} at {at}", burst.count, burst.kind)
            }
            Delivery::Teleport { player, from, to } => {
                println!("[teleport] {}: {from} -> {to}", player_label(server, *player))
            }
        }
    }
}

fn player_label(server: &Server, player: PlayerId) -> String {
    server
        .player(player)
        .map_or_else(|| player.to_string(), |online| online.name.clone())
}

fn write_transcript(server: &Server, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for delivery in server.deliveries() {
        serde_json::to_writer(&mut out, delivery)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
