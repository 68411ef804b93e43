//! Notification Store
//!
//! A persistent source of relay messages:
//!
//! - **notifications**: SQLite table of notifications
//! - **feed**: change feed that relays new rows to every peer
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! POST /api/v1/notifications ─┐
//!                             ├─→ notifications table ─→ ChangeFeed (poll) ─→ Broadcaster
//! other writers (same file) ──┘
//! ```

pub mod error;
pub mod feed;
pub mod notifications;

pub use error::{StoreError, StoreResult};
pub use feed::{ChangeFeed, FeedConfig};
pub use notifications::{Notification, NotificationStore};
