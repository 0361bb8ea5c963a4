//! shufflebox - Main entry point
//!
//! Builds the session (sequencer over the shuffle folder, audio backend,
//! transport), starts the monitoring tasks and the HTTP control server, and
//! runs the terminal front end unless asked not to. The session ends on
//! stop, on an exhausted shuffle, or on a termination signal.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shufflebox::api::{self, AppContext};
use shufflebox::audio::RodioBackend;
use shufflebox::config::{Config, ConfigOverrides};
use shufflebox::events::{EventBus, PlayerEvent};
use shufflebox::playback::{monitor, Sequencer, SharedTransport, Transport};
use shufflebox::{ui, Error};

/// Command-line arguments for shufflebox
#[derive(Parser, Debug)]
#[command(name = "shufflebox")]
#[command(about = "Shuffles a folder of music. That is all.")]
#[command(version)]
struct Args {
    /// Folder to shuffle (default: your music directory)
    #[arg(env = "SHUFFLEBOX_FOLDER")]
    shuffle_folder: Option<PathBuf>,

    /// Port for the remote control server
    #[arg(short, long, env = "SHUFFLEBOX_PORT")]
    port: Option<u16>,

    /// Path to a TOML configuration file
    #[arg(short, long, env = "SHUFFLEBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Run only the control server, without the terminal front end
    #[arg(long)]
    server_only: bool,
}

fn init_tracing(config: &Config, terminal_ui_active: bool) -> Result<()> {
    // The terminal front end owns the screen; without a log file configured,
    // logs are discarded rather than corrupting raw mode.
    let writer = match &config.logging.file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("failed to open log file {:?}", path))?;
            BoxMakeWriter::new(Arc::new(file))
        }
        None if terminal_ui_active => BoxMakeWriter::new(std::io::sink),
        None => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("shufflebox={}", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = ConfigOverrides {
        port: args.port,
        shuffle_folder: args.shuffle_folder,
    };
    let config = Config::load(args.config.as_deref(), overrides)?;
    let terminal_ui_active = !args.server_only;

    init_tracing(&config, terminal_ui_active)?;

    info!("starting shufflebox on port {}", config.port);
    info!("shuffle folder: {}", config.shuffle_folder.display());

    // Build the session
    let sequencer = Sequencer::new(&config.shuffle_folder)
        .context("failed to enumerate the shuffle folder")?;
    info!("shuffled {} tracks", sequencer.len());

    let backend = RodioBackend::new().context("failed to open the audio output")?;
    let events = EventBus::new(100);
    let mut transport = Transport::new(
        sequencer,
        Box::new(backend),
        events.clone(),
        config.watchdog.stale_threshold,
        config.initial_volume,
    );
    match transport.start() {
        Ok(()) => {}
        Err(Error::Exhausted) => {
            info!("nothing playable in the shuffle folder");
            return Ok(());
        }
        Err(e) => return Err(e).context("failed to start playback"),
    }

    let transport: SharedTransport = Arc::new(tokio::sync::Mutex::new(transport));

    monitor::start_monitoring(
        transport.clone(),
        events.clone(),
        config.watchdog_poll_interval(),
        config.progress_interval(),
    );

    let ctx = AppContext {
        transport: transport.clone(),
        events: events.clone(),
    };
    let shutdown = shutdown_signal(transport.clone(), events.subscribe());

    let ui_handle = terminal_ui_active.then(|| {
        let transport = transport.clone();
        let refresh = config.ui_refresh_delay();
        tokio::task::spawn_blocking(move || ui::run(transport, refresh))
    });

    api::server::run(config.port, ctx, shutdown)
        .await
        .context("server error")?;

    if let Some(handle) = ui_handle {
        if let Err(e) = handle.await.context("terminal front end panicked")? {
            warn!("terminal front end error: {}", e);
        }
    }

    info!("server shutdown complete");
    Ok(())
}

/// Resolves when the session should end: termination signal or the
/// transport reporting the session over.
async fn shutdown_signal(
    transport: SharedTransport,
    mut events: broadcast::Receiver<PlayerEvent>,
) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let session_ended = async {
        loop {
            match events.recv().await {
                Ok(PlayerEvent::SessionEnded) => break,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C, shutting down");
            let _ = transport.lock().await.stop();
        },
        _ = terminate => {
            info!("received terminate signal, shutting down");
            let _ = transport.lock().await.stop();
        },
        _ = session_ended => {
            info!("session ended");
        },
    }
}
