//! Notification Store - SQLite-backed table of relayable notifications
//!
//! Rows are append-only and identified by an autoincrement id, which doubles
//! as the change-feed cursor. Any writer that inserts into the table (this
//! process through the HTTP API, or another process sharing the file) makes
//! the row visible to the feed on its next poll.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OpenFlags};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use utoipa::ToSchema;

use super::error::{StoreError, StoreResult};

/// A stored notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Notification {
    /// Monotonic row id
    pub id: i64,
    /// Text relayed to peers
    pub message: String,
    /// Insertion time
    pub created_at: DateTime<Utc>,
}

/// SQLite-backed notification table
pub struct NotificationStore {
    /// std::sync::Mutex because rusqlite::Connection is !Sync
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl NotificationStore {
    /// Create or open a store at `path`
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )?;

        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Create a private in-memory store
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> StoreResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                message TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    /// Append a notification
    pub fn insert(&self, message: &str) -> StoreResult<Notification> {
        let now = Utc::now();
        let millis = now.timestamp_millis();

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO notifications (message, created_at) VALUES (?, ?)",
            params![message, millis],
        )?;
        let id = conn.last_insert_rowid();

        Ok(Notification {
            id,
            message: message.to_string(),
            created_at: to_datetime(id, millis)?,
        })
    }

    /// Notifications with id greater than `after`, oldest first
    pub fn since(&self, after: i64, limit: usize) -> StoreResult<Vec<Notification>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, message, created_at FROM notifications
             WHERE id > ?
             ORDER BY id ASC
             LIMIT ?",
        )?;

        let rows = stmt.query_map(params![after, limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut notifications = Vec::new();
        for row in rows {
            let (id, message, millis) = row?;
            notifications.push(Notification {
                id,
                message,
                created_at: to_datetime(id, millis)?,
            });
        }
        Ok(notifications)
    }

    /// Highest id currently stored, or 0 for an empty table
    pub fn latest_id(&self) -> StoreResult<i64> {
        let conn = self.lock()?;
        let id: Option<i64> =
            conn.query_row("SELECT MAX(id) FROM notifications", [], |row| row.get(0))?;
        Ok(id.unwrap_or(0))
    }

    /// Get count of stored notifications
    pub fn count(&self) -> StoreResult<u64> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM notifications", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Get the database file path, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn to_datetime(id: i64, millis: i64) -> StoreResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(StoreError::InvalidTimestamp { id, millis })
}
