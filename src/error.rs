//! Process-level error type

use thiserror::Error;

/// Errors that stop the relay process
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("Notification store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Server error: {0}")]
    Api(#[from] crate::api::ApiError),
}

/// Result type alias for process-level operations
pub type RelayResult<T> = Result<T, RelayError>;
