//! takwatch: follow a live Tak broadcast from the terminal.
//!
//! Connects to a Racetrack broadcast, keeps a PTN transcript of the game in
//! sync with every update and prints moves, engine analysis and clocks as
//! they arrive. Connection failures are retried after a fixed delay until
//! the process is interrupted.
//!
//! All tunables have environment variable defaults (see [`config`]);
//! command-line flags override them.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use racetrack_client::{PollingTransport, SseTransport};
use tak_sync::{Collaborators, Runner, SyncConfig, Transport, ViewerEvent, ViewerSyncState};
use tokio::sync::mpsc;
use tracing::Instrument;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::TransportKind;
use prefs::JsonPreferenceStore;
use sinks::{ConsoleChart, ConsoleStatus, ConsoleViewer};

mod config;
mod prefs;
mod sinks;

/// Command-line arguments for takwatch.
#[derive(Parser)]
#[command(name = "takwatch", about = "Follow a live Tak broadcast", version)]
struct Cli {
    /// Broadcast endpoint. Defaults to `TAKWATCH_URL` or the public Racetrack board.
    #[arg(long)]
    url: Option<String>,

    /// How to fetch updates. Defaults to `TAKWATCH_TRANSPORT` or `sse`.
    #[arg(long, value_enum)]
    transport: Option<TransportKind>,

    /// Delay before reconnecting after a failure, in milliseconds.
    #[arg(long)]
    retry_ms: Option<u64>,

    /// Delay between snapshot requests in polling mode, in milliseconds.
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Keep this file updated with the PTN of the current game.
    #[arg(long)]
    ptn_out: Option<PathBuf>,

    /// Preference file. Defaults to `TAKWATCH_PREFS_PATH` or `~/.takwatch/preferences.json`.
    #[arg(long)]
    prefs: Option<PathBuf>,

    /// Also write logs to daily rolling files in this directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_deref())?;

    let url = cli.url.unwrap_or_else(config::get_url);
    let transport_kind = cli.transport.unwrap_or_else(config::get_transport);
    let retry_delay = cli
        .retry_ms
        .map(Duration::from_millis)
        .unwrap_or_else(config::get_retry_delay);
    let poll_interval = cli
        .poll_interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(config::get_poll_interval);

    let preferences = JsonPreferenceStore::new(cli.prefs.unwrap_or_else(config::get_prefs_path));
    tracing::info!("Using preferences at {}", preferences.path().display());

    let collaborators = Collaborators {
        viewer: Box::new(ConsoleViewer::new(cli.ptn_out)),
        chart: Box::new(ConsoleChart),
        status: Box::new(ConsoleStatus),
        preferences: Box::new(preferences),
    };
    let sync_config = SyncConfig {
        retry_delay,
        ..Default::default()
    };

    let span = tracing::info_span!("takwatch", %url, transport = ?transport_kind);
    match transport_kind {
        TransportKind::Sse => {
            let transport = SseTransport::new(&url).context("Invalid broadcast URL")?;
            watch(sync_config, transport, collaborators).instrument(span).await
        }
        TransportKind::Poll => {
            let transport =
                PollingTransport::new(&url, poll_interval).context("Invalid broadcast URL")?;
            watch(sync_config, transport, collaborators).instrument(span).await
        }
    }
}

async fn watch<T: Transport>(
    config: SyncConfig,
    transport: T,
    collaborators: Collaborators,
) -> anyhow::Result<()> {
    tracing::info!("Starting takwatch");

    // the console viewer is loaded right away and always sits on the newest ply
    let (viewer_tx, viewer_rx) = mpsc::channel(16);
    viewer_tx
        .send(ViewerEvent::GameState(ViewerSyncState::default()))
        .await
        .context("Viewer channel closed")?;

    let runner = Runner::new(config, transport, collaborators);
    let driver = runner
        .run(viewer_rx, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    if let Some(doc) = driver.document() {
        tracing::info!(
            round = doc.round_number,
            plies = doc.ply_count(),
            "Shutting down"
        );
    }
    drop(viewer_tx);
    Ok(())
}

fn init_tracing(
    log_dir: Option<&std::path::Path>,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, "takwatch");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    Ok(guard)
}
