//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::store::FeedConfig;
use crate::websocket::HubConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub console: ConsoleConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Relay core configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,

    #[serde(default = "default_send_timeout")]
    pub send_timeout_ms: u64,

    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

fn default_max_connections() -> usize {
    1000
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_send_timeout() -> u64 {
    5000 // 5 seconds
}

fn default_max_message_bytes() -> usize {
    64 * 1024 // 64 KB
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            outbound_buffer: default_outbound_buffer(),
            send_timeout_ms: default_send_timeout(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

impl RelayConfig {
    /// Hub settings derived from this section
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            max_connections: self.max_connections,
            outbound_buffer: self.outbound_buffer,
            send_timeout: Duration::from_millis(self.send_timeout_ms),
            max_message_bytes: self.max_message_bytes,
        }
    }
}

/// HTTP server configuration
///
/// The port and advertised host come from the command line.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            cors_origins: Vec::new(),
        }
    }
}

/// Notification store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_enabled")]
    pub enabled: bool,

    #[serde(default = "default_store_path")]
    pub path: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_store_enabled() -> bool {
    true
}

fn default_store_path() -> String {
    dirs::data_local_dir()
        .map(|p| {
            p.join("wsrelay")
                .join("notifications.db")
                .to_string_lossy()
                .to_string()
        })
        .unwrap_or_else(|| "./wsrelay_data/notifications.db".to_string())
}

fn default_poll_interval() -> u64 {
    500
}

fn default_batch_size() -> usize {
    100
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: default_store_enabled(),
            path: default_store_path(),
            poll_interval_ms: default_poll_interval(),
            batch_size: default_batch_size(),
        }
    }
}

impl StoreConfig {
    /// Change feed settings derived from this section
    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            batch_size: self.batch_size.max(1),
        }
    }
}

/// Console input configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_console_enabled")]
    pub enabled: bool,
}

fn default_console_enabled() -> bool {
    true
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: default_console_enabled(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("wsrelay").join("config.toml")),
            Some(PathBuf::from("/etc/wsrelay/config.toml")),
            Some(PathBuf::from("./wsrelay.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Relay overrides
        if let Ok(max) = std::env::var("WSRELAY_MAX_CONNECTIONS") {
            if let Ok(m) = max.parse() {
                self.relay.max_connections = m;
            }
        }

        // API overrides
        if let Ok(host) = std::env::var("WSRELAY_BIND_HOST") {
            self.api.bind_host = host;
        }

        // Store overrides
        if let Ok(path) = std::env::var("WSRELAY_STORE_PATH") {
            self.store.path = path;
        }
        if let Ok(enabled) = std::env::var("WSRELAY_STORE_ENABLED") {
            self.store.enabled = enabled.to_lowercase() != "false" && enabled != "0";
        }

        // Logging overrides
        if let Ok(level) = std::env::var("WSRELAY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("WSRELAY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# wsrelay Configuration
#
# Environment variables override these settings:
# - WSRELAY_MAX_CONNECTIONS
# - WSRELAY_BIND_HOST
# - WSRELAY_STORE_PATH
# - WSRELAY_STORE_ENABLED
# - WSRELAY_LOG_LEVEL
# - WSRELAY_LOG_FORMAT

[relay]
# Maximum number of concurrently connected peers
max_connections = 1000

# Frames queued per peer before further sends to it are dropped
outbound_buffer = 256

# A socket write slower than this closes the peer (ms)
send_timeout_ms = 5000

# Largest accepted inbound frame (bytes)
max_message_bytes = 65536

[api]
# Interface the HTTP/WebSocket server binds to
bind_host = "0.0.0.0"

# Allowed CORS origins (empty = allow any)
cors_origins = []

[store]
# Relay rows inserted into the notification table
enabled = true

# SQLite database file
path = "./wsrelay_data/notifications.db"

# How often to check for new notifications (ms)
poll_interval_ms = 500

# Maximum notifications relayed per poll
batch_size = 100

[console]
# Relay lines typed on standard input
enabled = true

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
