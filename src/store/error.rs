//! Notification store error types

use thiserror::Error;

/// Errors that can occur in the notification store
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite reported an error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored timestamp could not be converted
    #[error("Invalid timestamp in row {id}: {millis}")]
    InvalidTimestamp { id: i64, millis: i64 },

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
