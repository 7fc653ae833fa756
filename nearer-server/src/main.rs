//! Nearer server - main entry point
//!
//! Hosts the shared playback queue: a simulated native player, the queue
//! manager, and the HTTP/SSE API clients connect to.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use nearer_common::config::{resolve_config_path, TomlConfig, CONFIG_ENV_VAR};
use nearer_server::api::{self, AppContext};
use nearer_server::config::{Overrides, ServerConfig};
use nearer_server::playback::{
    notification_channel, spawn_progress_ticker, Broadcaster, QueueHooks, QueueManager,
    SimulatedPlayer,
};
use nearer_server::resolver::build_resolver;
use nearer_server::sessions::SessionRegistry;
use nearer_server::sse::SseBroadcaster;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for nearer-server
#[derive(Parser, Debug)]
#[command(name = "nearer-server")]
#[command(about = "Shared playback queue server")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "NEARER_PORT")]
    port: Option<u16>,

    /// Address to bind to (overrides config file)
    #[arg(short, long, env = "NEARER_BIND")]
    bind: Option<String>,

    /// Log level when RUST_LOG is unset (overrides config file)
    #[arg(long, env = "NEARER_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // clap already folded NEARER_CONFIG into args.config
    let config_path = resolve_config_path(args.config.as_deref(), CONFIG_ENV_VAR);
    // Logging starts after the config is read, so the outcome is reported below
    let toml_config =
        TomlConfig::load_or_default(config_path.as_deref()).context("Failed to load config file")?;
    let overrides = Overrides {
        port: args.port,
        bind_address: args.bind,
        log_level: args.log_level,
    };
    let config = ServerConfig::from_toml(toml_config, &overrides).context("Invalid configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.default_log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Nearer server v{} ({}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );
    match &config_path {
        Some(path) if path.exists() => info!("Configuration loaded from {}", path.display()),
        Some(path) => warn!("Config file {} not found, using defaults", path.display()),
        None => info!("No config file found, using built-in defaults"),
    }

    let (notify_tx, notify_rx) = notification_channel();
    let player = Arc::new(SimulatedPlayer::spawn(notify_tx).context("Failed to start player thread")?);

    let broadcaster = Arc::new(SseBroadcaster::new(config.event_capacity));
    let queue = build_queue(&config, player, &broadcaster)?;

    let pump = tokio::spawn(Arc::clone(&queue).run_notifications(notify_rx));
    let ticker = spawn_progress_ticker(Arc::clone(&queue), config.progress_interval);

    let ctx = AppContext {
        queue,
        broadcaster,
        sessions: Arc::new(SessionRegistry::new()),
        require_identification: config.require_identification,
    };

    api::run(ctx, config.bind, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    if let Some(ticker) = ticker {
        ticker.abort();
    }
    pump.abort();

    info!("Server shutdown complete");
    Ok(())
}

/// Queue manager wired to the player, the configured resolver and the SSE bus
fn build_queue(
    config: &ServerConfig,
    player: Arc<SimulatedPlayer>,
    broadcaster: &Arc<SseBroadcaster>,
) -> Result<Arc<QueueManager>> {
    let resolver = build_resolver(&config.resolver).context("Failed to build resolver")?;

    let hooks = QueueHooks::default()
        .on_song_end(|ended| {
            info!(cursor = ended.current_song_idx, status = %ended.status, "Song ended");
        })
        .on_status_change(|status| {
            info!(status = %status.status, time_ms = status.time, "Playback status changed");
        });

    let queue = Arc::new(QueueManager::new(
        player,
        resolver,
        Arc::clone(broadcaster) as Arc<dyn Broadcaster>,
        config.queue_options(hooks),
    ));
    info!(max_history = config.max_history, "Queue manager initialized");
    Ok(queue)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nearer_common::config::CatalogEntry;
    use nearer_common::NearerEvent;

    #[test]
    fn test_args_override_port_and_bind() {
        let args =
            Args::try_parse_from(["nearer-server", "--port", "6010", "--bind", "127.0.0.1"]).unwrap();
        assert_eq!(args.port, Some(6010));
        assert_eq!(args.bind.as_deref(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_queue_publishes_to_sse_subscribers() {
        let mut config = ServerConfig::default();
        config.resolver.catalog.push(CatalogEntry {
            key: "demo".to_string(),
            url: "file:///srv/music/demo.ogg".to_string(),
            title: "Demo".to_string(),
            duration: 600,
            thumb: String::new(),
            thumb_big: String::new(),
        });
        let (tx, _rx) = notification_channel();
        let player = Arc::new(SimulatedPlayer::spawn(tx).unwrap());
        let broadcaster = Arc::new(SseBroadcaster::new(config.event_capacity));
        let mut events = broadcaster.subscribe();

        let queue = build_queue(&config, player, &broadcaster).unwrap();
        queue.add("alice", "demo").await.unwrap();

        let envelope = events.recv().await.unwrap();
        assert_eq!(envelope.recipient, None);
        match envelope.event {
            NearerEvent::Added(added) => assert_eq!(added.song.title, "Demo"),
            other => panic!("Expected added event, got {:?}", other),
        }
    }
}
