#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use wsrelay::api::{serve_with_shutdown, AppState, ServerConfig};
use wsrelay::store::{ChangeFeed, FeedConfig, NotificationStore};
use wsrelay::websocket::{ConnectionHub, Envelope, HubConfig};
use wsrelay::{Broadcaster, RelayClient};

pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);
pub const QUIET_PERIOD: Duration = Duration::from_millis(300);

pub struct TestServer {
    pub addr: SocketAddr,
    pub hub: Arc<ConnectionHub>,
    pub broadcaster: Broadcaster,
    pub store: Option<Arc<NotificationStore>>,
    shutdown: Option<oneshot::Sender<()>>,
    feed_shutdown: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(HubConfig::default(), false).await
    }

    pub async fn start_with_store() -> Self {
        Self::start_with(HubConfig::default(), true).await
    }

    pub async fn start_with(hub_config: HubConfig, with_store: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let hub = Arc::new(ConnectionHub::new(hub_config));
        let mut state = AppState::new(
            Arc::clone(&hub),
            ServerConfig::new("127.0.0.1", addr.port()),
        );

        let mut feed_shutdown = None;
        if with_store {
            let store = Arc::new(NotificationStore::open_in_memory().unwrap());
            let feed = ChangeFeed::new(
                Arc::clone(&store),
                state.broadcaster.clone(),
                FeedConfig {
                    poll_interval: Duration::from_millis(20),
                    batch_size: 100,
                },
            )
            .unwrap();
            let (tx, rx) = watch::channel(false);
            feed.start(rx);
            feed_shutdown = Some(tx);
            state = state.with_store(store);
        }

        let broadcaster = state.broadcaster.clone();
        let store = state.store.clone();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let signal = async {
                let _ = shutdown_rx.await;
            };
            serve_with_shutdown(listener, state, signal).await.unwrap();
        });

        Self {
            addr,
            hub,
            broadcaster,
            store,
            shutdown: Some(shutdown_tx),
            feed_shutdown,
            handle: Some(handle),
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Connect a client and wait until the hub has registered it
    pub async fn connect(&self) -> RelayClient {
        let before = self.hub.len().await;
        let client = RelayClient::connect(&self.ws_url()).await.unwrap();
        self.wait_for_peers(before + 1).await;
        client
    }

    pub async fn connect_many(&self, n: usize) -> Vec<RelayClient> {
        let mut clients = Vec::with_capacity(n);
        for _ in 0..n {
            clients.push(self.connect().await);
        }
        clients
    }

    pub async fn wait_for_peers(&self, expected: usize) {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        while self.hub.len().await != expected {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {expected} peers, have {}",
                self.hub.len().await
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.feed_shutdown.take() {
            let _ = tx.send(true);
        }
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

pub async fn recv(client: &mut RelayClient) -> Envelope {
    tokio::time::timeout(RECV_TIMEOUT, client.next_envelope())
        .await
        .expect("timeout waiting for envelope")
        .expect("connection closed")
        .expect("undecodable envelope")
}

/// Assert nothing is delivered to `client` for a short while
pub async fn assert_silent(client: &mut RelayClient) {
    if let Ok(Some(result)) = tokio::time::timeout(QUIET_PERIOD, client.next_envelope()).await {
        panic!("expected no delivery, got {result:?}");
    }
}
