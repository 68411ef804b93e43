//! Connection Hub
//!
//! The registry of live peers. This is the only shared mutable structure in
//! the relay; every access goes through one async `RwLock`.
//!
//! Iteration works on a snapshot: the peer list is cloned under the read lock
//! and the lock is released before any callback runs, so callbacks never hold
//! the lock and concurrent add/remove can proceed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::peer::{Peer, PeerId};

/// Manages all live peer connections
pub struct ConnectionHub {
    /// Active peers: PeerId → Peer
    peers: RwLock<HashMap<PeerId, Arc<Peer>>>,
    /// Configuration
    config: HubConfig,
}

/// Configuration for the connection hub and its peers
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent peers, enforced by [`ConnectionHub::try_add`]
    pub max_connections: usize,
    /// Frames buffered per peer before sends are rejected
    pub outbound_buffer: usize,
    /// Maximum time a single socket write may take before the peer is dropped
    pub send_timeout: Duration,
    /// Maximum inbound frame size in bytes
    pub max_message_bytes: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            outbound_buffer: 256,
            send_timeout: Duration::from_secs(5),
            max_message_bytes: 64 * 1024,
        }
    }
}

impl ConnectionHub {
    /// Create a new connection hub
    pub fn new(config: HubConfig) -> Self {
        Self {
            peers: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Register a peer
    pub async fn add(&self, peer: Arc<Peer>) {
        let id = peer.id();
        let total = {
            let mut peers = self.peers.write().await;
            peers.insert(id, peer);
            peers.len()
        };

        tracing::info!(peer_id = %id, peers = total, "Peer connected");
    }

    /// Register a peer unless the connection limit has been reached
    ///
    /// The check and the insert happen under one write lock, so concurrent
    /// upgrades cannot overshoot `max_connections`.
    pub async fn try_add(&self, peer: Arc<Peer>) -> bool {
        let id = peer.id();
        let total = {
            let mut peers = self.peers.write().await;
            if peers.len() >= self.config.max_connections {
                return false;
            }
            peers.insert(id, peer);
            peers.len()
        };

        tracing::info!(peer_id = %id, peers = total, "Peer connected");
        true
    }

    /// Remove a peer
    ///
    /// Returns `true` if the peer was registered. Removing an absent peer is a
    /// no-op.
    pub async fn remove(&self, id: &PeerId) -> bool {
        let (removed, total) = {
            let mut peers = self.peers.write().await;
            let removed = peers.remove(id).is_some();
            (removed, peers.len())
        };

        if removed {
            tracing::info!(peer_id = %id, peers = total, "Peer disconnected");
        }
        removed
    }

    /// Copy of the current peer list
    pub async fn snapshot(&self) -> Vec<Arc<Peer>> {
        self.peers.read().await.values().cloned().collect()
    }

    /// Invoke `f` once for every registered peer except `excluded`
    ///
    /// `None` matches every peer. Peers registered after the call starts are
    /// not visited; a peer removed while the call runs may still be visited.
    pub async fn for_each_except<F>(&self, excluded: Option<PeerId>, mut f: F)
    where
        F: FnMut(&Arc<Peer>),
    {
        let snapshot = self.snapshot().await;
        for peer in snapshot
            .iter()
            .filter(|peer| Some(peer.id()) != excluded)
        {
            f(peer);
        }
    }

    pub async fn contains(&self, id: &PeerId) -> bool {
        self.peers.read().await.contains_key(id)
    }

    pub async fn peer_ids(&self) -> Vec<PeerId> {
        self.peers.read().await.keys().copied().collect()
    }

    /// Get the current peer count
    pub async fn len(&self) -> usize {
        self.peers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.peers.read().await.is_empty()
    }

    /// Whether the connection limit has been reached
    pub async fn is_full(&self) -> bool {
        self.len().await >= self.config.max_connections
    }
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}
