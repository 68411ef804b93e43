//! # wsrelay
//!
//! Real-time WebSocket message relay. Peers connect to a central hub and every
//! message one participant sends is fanned out to all other connected peers.
//!
//! ## Features
//!
//! - **Fan-out**: each message reaches every live peer except its sender
//! - **Isolation**: a slow or dead peer never delays delivery to the others
//! - **Lenient protocol**: unknown events and malformed frames are dropped, not fatal
//! - **External sources**: HTTP endpoint, SQLite notification feed, console input
//!
//! ## Modules
//!
//! - [`websocket`]: Peer registry, broadcast engine and per-peer dispatcher
//! - [`store`]: Notification store and its change feed
//! - [`console`]: Operator input source
//! - [`api`]: HTTP server with Axum
//! - [`client`]: WebSocket client for the relay protocol
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wsrelay::api::{serve, AppState, ServerConfig};
//! use wsrelay::websocket::{ConnectionHub, HubConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hub = Arc::new(ConnectionHub::new(HubConfig::default()));
//!     let config = ServerConfig::new("localhost", 8080);
//!     let state = AppState::new(hub, config.clone());
//!
//!     // Relay a message from outside any peer connection
//!     state.broadcaster.publish("relay starting").await;
//!
//!     serve(state, &config).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod store;
pub mod websocket;

// Re-export top-level types for convenience
pub use websocket::{
    BroadcastReport, Broadcaster, ConnectionHub, DecodeError, Envelope, EventKind, HubConfig,
    Inbound, Peer, PeerId, PeerState, SendError,
};

pub use store::{ChangeFeed, FeedConfig, Notification, NotificationStore, StoreError};

pub use api::{build_router, serve, serve_with_shutdown, ApiError, AppState, ServerConfig};

pub use client::{ClientError, RelayClient};

pub use config::{Config, ConfigError, LoggingConfig};

pub use error::{RelayError, RelayResult};
