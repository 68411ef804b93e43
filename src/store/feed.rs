//! Change Feed
//!
//! Polls the notification table and relays every new row to all peers. The
//! cursor starts at the newest row present when the feed starts, so rows
//! that existed before startup are not replayed.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::error::StoreResult;
use super::notifications::NotificationStore;
use crate::websocket::Broadcaster;

/// Configuration for the change feed
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Time between polls
    pub poll_interval: Duration,
    /// Maximum rows relayed per poll
    pub batch_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            batch_size: 100,
        }
    }
}

/// Relays new notification rows through a [`Broadcaster`]
pub struct ChangeFeed {
    store: Arc<NotificationStore>,
    broadcaster: Broadcaster,
    config: FeedConfig,
    cursor: i64,
}

impl ChangeFeed {
    /// Create a feed positioned after the newest stored row
    pub fn new(
        store: Arc<NotificationStore>,
        broadcaster: Broadcaster,
        config: FeedConfig,
    ) -> StoreResult<Self> {
        let cursor = store.latest_id()?;
        Ok(Self {
            store,
            broadcaster,
            config,
            cursor,
        })
    }

    /// Id of the last relayed row
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Relay one batch of new rows
    ///
    /// Returns the number of rows relayed.
    pub async fn poll_once(&mut self) -> StoreResult<usize> {
        let batch = self.store.since(self.cursor, self.config.batch_size)?;

        for notification in &batch {
            let report = self.broadcaster.publish(notification.message.as_str()).await;
            tracing::debug!(
                notification_id = notification.id,
                delivered = report.delivered,
                "Relayed stored notification"
            );
            self.cursor = notification.id;
        }

        Ok(batch.len())
    }

    /// Poll in the background until `shutdown` flips to true or its sender is dropped
    pub fn start(mut self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.config.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(cursor = self.cursor, "Notification change feed started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // Drain full batches before waiting for the next tick
                        loop {
                            match self.poll_once().await {
                                Ok(n) if n == self.config.batch_size && n > 0 => continue,
                                Ok(_) => break,
                                Err(e) => {
                                    tracing::error!(error = %e, "Change feed poll failed");
                                    break;
                                }
                            }
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!(cursor = self.cursor, "Notification change feed stopped");
        })
    }
}
