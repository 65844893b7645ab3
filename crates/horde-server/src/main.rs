mod config;
mod connection;
mod handler;
mod lobby;
mod room;
mod scheduler;
mod server;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use horde_common::spawn::SpawnTable;

use crate::config::GameConfig;

/// Horde Server - two-player room relay with server-driven enemy waves
#[derive(Parser, Debug)]
#[command(name = "horde-server", version, about)]
struct Args {
    /// Interface to bind the server to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Maximum simultaneous connections allowed
    #[arg(short, long, default_value_t = 100)]
    max_connections: usize,

    /// Milliseconds between enemy spawns while a wave is running
    #[arg(long, default_value_t = config::DEFAULT_SPAWN_INTERVAL_MS)]
    spawn_interval_ms: u64,

    /// Milliseconds between clearing a wave and starting the next one
    #[arg(long, default_value_t = config::DEFAULT_WAVE_DELAY_MS)]
    wave_delay_ms: u64,

    /// JSON file mapping each map to its enemy type weights
    #[arg(long)]
    spawn_table: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "horde_server=debug,horde_common=debug".into()),
        )
        .init();

    let args = Args::parse();

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;

    let spawn_table = match &args.spawn_table {
        Some(path) => {
            tracing::info!("Loading spawn table from {}", path.display());
            SpawnTable::from_json(&std::fs::read_to_string(path)?)?
        }
        None => SpawnTable::default(),
    };

    let config = GameConfig {
        spawn_interval: Duration::from_millis(args.spawn_interval_ms.max(1)),
        wave_clear_delay: Duration::from_millis(args.wave_delay_ms),
        spawn_table,
        ..GameConfig::default()
    };

    tracing::info!(
        "Starting horde server on {} (max {} connections)",
        addr,
        args.max_connections
    );
    server::run(addr, server::ServerState::new(config, args.max_connections)).await
}
