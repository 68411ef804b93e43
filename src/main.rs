//! wsrelay Server
//!
//! Run with: cargo run --bin wsrelay -- <address> <port>
//!
//! `address` is the host peers use to reach the relay; it is advertised by
//! `GET /api/v1/endpoint`. The server binds `bind_host:port` (see config).
//!
//! # Configuration
//!
//! A TOML file passed with `--config`, or found in a default location, plus
//! environment overrides:
//! - `WSRELAY_MAX_CONNECTIONS`: Peer limit (default: 1000)
//! - `WSRELAY_BIND_HOST`: Interface to bind (default: 0.0.0.0)
//! - `WSRELAY_STORE_PATH`: Notification database file
//! - `WSRELAY_STORE_ENABLED`: Enable the notification feed (default: true)
//! - `WSRELAY_LOG_LEVEL` / `RUST_LOG`: Log level (default: info)
//! - `WSRELAY_LOG_FORMAT`: pretty or json

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use wsrelay::api::{serve_with_shutdown, shutdown_signal, AppState, ServerConfig};
use wsrelay::config::Config;
use wsrelay::store::{ChangeFeed, NotificationStore};
use wsrelay::websocket::ConnectionHub;
use wsrelay::{console, logging, RelayError};

#[derive(Parser, Debug)]
#[command(name = "wsrelay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Real-time WebSocket message relay")]
struct Args {
    /// Host peers use to reach this relay
    address: String,

    /// Port to listen on
    port: u16,

    /// Path to a TOML config file
    #[arg(short, long, env = "WSRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Do not relay lines typed on standard input
    #[arg(long)]
    no_console: bool,

    /// Disable the notification store and its change feed
    #[arg(long)]
    no_store: bool,
}

#[tokio::main]
async fn main() -> Result<(), RelayError> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    logging::init(&config.logging);

    tracing::info!("Starting wsrelay v{}", env!("CARGO_PKG_VERSION"));

    let hub = Arc::new(ConnectionHub::new(config.relay.hub_config()));
    let server_config = ServerConfig {
        advertised_host: args.address.clone(),
        bind_host: config.api.bind_host.clone(),
        port: args.port,
        cors_origins: config.api.cors_origins.clone(),
    };
    let mut state = AppState::new(hub, server_config.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Notification store and change feed
    let feed_handle = if config.store.enabled && !args.no_store {
        let store = Arc::new(NotificationStore::open(Path::new(&config.store.path))?);
        tracing::info!("Notification store: {}", config.store.path);

        let feed = ChangeFeed::new(
            Arc::clone(&store),
            state.broadcaster.clone(),
            config.store.feed_config(),
        )?;
        state = state.with_store(store);
        Some(feed.start(shutdown_rx))
    } else {
        tracing::info!("Notification store disabled");
        None
    };

    // Operator console
    if config.console.enabled && !args.no_console {
        console::spawn_stdin(state.broadcaster.clone());
        tracing::info!("Relaying console input");
    }

    let listener = TcpListener::bind(server_config.addr()).await?;
    tracing::info!("Server started at {}", server_config.endpoint_url());

    let signal = async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    };
    serve_with_shutdown(listener, state, signal).await?;

    if let Some(handle) = feed_handle {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Change feed task ended abnormally");
        }
    }

    tracing::info!("wsrelay stopped");
    Ok(())
}
