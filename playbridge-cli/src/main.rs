//! Playbridge headless host
//!
//! Mounts one content in a view with no display, then:
//! 1. Reads guest messages from stdin, one JSON object per line:
//!    `{"origin": "https://...", "message": {...}}`
//! 2. Writes every host → guest bus message to stdout as JSON
//!
//! Usage:
//!   playbridge --content-url /games/quiz/ --player-id u1 --player-name Alice \
//!     --play-id p1 --play-token tok --playlog-server-url wss://playlog.example.com

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use playbridge_cli::{read_manifest, stock_content, write_bus_message, InboundLine, LogSurface};
use playbridge_host::{BridgeConfig, GameView};
use playbridge_types::{ExecutionMode, PlayConfig, Player};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "playbridge")]
#[command(about = "Headless host for embedded game content")]
struct Args {
    /// Bridge config file (defaults to ~/.playbridge/bridge.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Content url, absolute or relative to the configured content origin
    #[arg(long)]
    content_url: String,

    /// Content manifest used to check required externals
    #[arg(long)]
    manifest: Option<PathBuf>,

    #[arg(long)]
    player_id: String,

    #[arg(long)]
    player_name: String,

    #[arg(long)]
    play_id: String,

    #[arg(long)]
    play_token: String,

    #[arg(long, value_enum, default_value = "passive")]
    mode: Mode,

    #[arg(long)]
    playlog_server_url: String,

    /// Confirm identity requests immediately instead of letting them time out
    #[arg(long)]
    accept_identity: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Active,
    Passive,
}

impl From<Mode> for ExecutionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Active => ExecutionMode::Active,
            Mode::Passive => ExecutionMode::Passive,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { "debug" } else { "info" };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let config = match &args.config {
        Some(path) => BridgeConfig::load_from(path),
        None => BridgeConfig::load(),
    };
    let manifest = read_manifest(args.manifest.as_deref())?;

    let play_config = PlayConfig::new(
        args.play_id,
        args.play_token,
        args.mode.into(),
        &args.playlog_server_url,
    )
    .context("Invalid play configuration")?;
    let content = stock_content(
        Player::new(args.player_id, args.player_name),
        play_config,
        &args.content_url,
        &config,
        args.accept_identity,
    )?;

    let mut view = GameView::from_config(LogSurface, &config).context("Failed to mount view")?;
    let mut handle = match &manifest {
        Some(manifest) => view.add_content_with_manifest(content, manifest),
        None => view.add_content(content),
    }
    .context("Failed to add content")?;
    info!(content_id = %handle.id, "Playbridge host running; reading guest messages from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    debug!("stdin closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match InboundLine::parse(&line) {
                    Ok(inbound) => view.deliver_raw(&inbound.origin, &inbound.envelope_json(handle.id)),
                    Err(e) => warn!("Skipping malformed input line: {}", e),
                }
            }
            Some(message) = handle.outbound.recv() => {
                write_bus_message(&mut std::io::stdout().lock(), &message)?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    view.destroy();
    while let Ok(message) = handle.outbound.try_recv() {
        write_bus_message(&mut std::io::stdout().lock(), &message)?;
    }
    Ok(())
}
