//! Broadcast Engine
//!
//! Fans one envelope out to every open peer except its originator. The
//! envelope is encoded once and the same frame is shared by all recipients.
//! A failed send only affects the peer it was meant for; that peer's own
//! dispatcher notices the broken connection and removes it.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use super::hub::ConnectionHub;
use super::messages::Envelope;
use super::peer::{Frame, PeerId, SendError};

/// Outcome of one broadcast pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BroadcastReport {
    /// Peers the frame was queued for
    pub delivered: usize,
    /// Peers skipped because they were already closing
    pub skipped: usize,
    /// Peers whose queue was full or whose writer had stopped
    pub failed: usize,
}

/// Delivers envelopes to the peers registered in a [`ConnectionHub`]
#[derive(Clone)]
pub struct Broadcaster {
    hub: Arc<ConnectionHub>,
}

impl Broadcaster {
    pub fn new(hub: Arc<ConnectionHub>) -> Self {
        Self { hub }
    }

    pub fn hub(&self) -> &Arc<ConnectionHub> {
        &self.hub
    }

    /// Deliver `envelope` to every open peer except `originator`
    pub async fn broadcast(&self, envelope: &Envelope, originator: Option<PeerId>) -> BroadcastReport {
        let frame: Frame = match envelope.encode() {
            Ok(text) => Arc::from(text),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode envelope");
                return BroadcastReport::default();
            }
        };

        let mut report = BroadcastReport::default();
        self.hub
            .for_each_except(originator, |peer| match peer.send(Arc::clone(&frame)) {
                Ok(()) => report.delivered += 1,
                Err(SendError::NotOpen(_)) => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::debug!(peer_id = %peer.id(), error = %e, "Send to peer failed");
                }
            })
            .await;

        tracing::trace!(
            event = envelope.event.as_str(),
            originator = ?originator,
            delivered = report.delivered,
            skipped = report.skipped,
            failed = report.failed,
            "Broadcast envelope"
        );

        report
    }

    /// Relay free text from a non-peer source (HTTP, store, console)
    pub async fn publish(&self, text: impl Into<String>) -> BroadcastReport {
        self.broadcast(&Envelope::message(text), None).await
    }
}
