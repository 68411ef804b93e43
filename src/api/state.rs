//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::store::NotificationStore;
use crate::websocket::{Broadcaster, ConnectionHub};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Registry of live peers
    pub hub: Arc<ConnectionHub>,
    /// Broadcast engine over `hub`
    pub broadcaster: Broadcaster,
    /// Notification store (optional)
    pub store: Option<Arc<NotificationStore>>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState without a notification store
    pub fn new(hub: Arc<ConnectionHub>, config: ServerConfig) -> Self {
        Self {
            broadcaster: Broadcaster::new(Arc::clone(&hub)),
            hub,
            store: None,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Attach a notification store
    pub fn with_store(mut self, store: Arc<NotificationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check if the notification store is available
    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }
}

/// HTTP/WebSocket server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host peers are told to connect to
    pub advertised_host: String,
    /// Interface to bind to
    pub bind_host: String,
    /// Port to listen on
    pub port: u16,
    /// Allowed CORS origins, empty for any
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            advertised_host: "localhost".to_string(),
            bind_host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Create config with custom advertised host and port
    pub fn new(advertised_host: impl Into<String>, port: u16) -> Self {
        Self {
            advertised_host: advertised_host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string to bind
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    /// Address new peers connect to
    pub fn endpoint_url(&self) -> String {
        format!("ws://{}:{}/ws", self.advertised_host, self.port)
    }
}
