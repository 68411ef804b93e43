//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and runs the per-peer dispatcher:
//! one receive loop that decodes frames and hands them to the broadcaster,
//! and one writer task that drains the peer's outbound queue into the socket.

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{IntoResponse, Response},
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::broadcast::Broadcaster;
use super::messages::{self, DecodeError, Inbound};
use super::peer::{Frame, Peer, PeerId};
use crate::api::{ApiError, AppState};

/// WebSocket upgrade handler
///
/// This is the entry point for peer connections. Upgrades are refused with
/// 503 once the hub has reached its connection limit.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    if state.hub.is_full().await {
        tracing::warn!(
            limit = state.hub.config().max_connections,
            "Connection limit reached, rejecting peer"
        );
        return ApiError::ServiceUnavailable("Connection limit reached".to_string())
            .into_response();
    }

    let broadcaster = state.broadcaster.clone();
    ws.max_message_size(state.hub.config().max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

/// Close code sent when the hub filled up between the upgrade check and registration
const CLOSE_TRY_AGAIN_LATER: u16 = 1013;

/// Run an established WebSocket connection until it closes
///
/// The connection ends when the peer disconnects, a socket write fails or
/// times out, or the peer is moved to `Closing` because its outbound queue
/// overflowed.
pub async fn handle_socket(mut socket: WebSocket, broadcaster: Broadcaster) {
    let hub = Arc::clone(broadcaster.hub());
    let config = hub.config().clone();

    let (peer, rx) = Peer::new(config.outbound_buffer);
    let peer = Arc::new(peer);
    let peer_id = peer.id();

    if !hub.try_add(Arc::clone(&peer)).await {
        tracing::warn!(
            limit = config.max_connections,
            "Connection limit reached after upgrade, closing peer"
        );
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: CLOSE_TRY_AGAIN_LATER,
                reason: Cow::from("Connection limit reached"),
            })))
            .await;
        return;
    }

    let (sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(write_loop(sender, rx, peer_id, config.send_timeout));

    let recv_broadcaster = broadcaster.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&recv_broadcaster, peer_id, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(peer_id = %peer_id, error = %e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    // Wait for either side to finish, or for the peer to be closed from outside
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
        _ = peer.closing() => {
            tracing::warn!(peer_id = %peer_id, "Peer left open state, disconnecting");
            recv_task.abort();
            send_task.abort();
        }
    }

    peer.mark_closing();
    hub.remove(&peer_id).await;
    peer.mark_closed();
}

/// Forward queued frames to the socket
async fn write_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Frame>,
    peer_id: PeerId,
    send_timeout: Duration,
) {
    while let Some(frame) = rx.recv().await {
        match tokio::time::timeout(send_timeout, sender.send(Message::Text(frame.to_string()))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(peer_id = %peer_id, error = %e, "WebSocket send failed, closing connection");
                return;
            }
            Err(_) => {
                tracing::warn!(
                    peer_id = %peer_id,
                    timeout_ms = send_timeout.as_millis() as u64,
                    "WebSocket send timed out, closing connection"
                );
                return;
            }
        }
    }
}

/// Handle a received WebSocket message
///
/// Returns false if the connection should be closed.
pub async fn handle_ws_message(broadcaster: &Broadcaster, peer_id: PeerId, message: Message) -> bool {
    match message {
        Message::Text(text) => {
            dispatch(broadcaster, peer_id, messages::decode(&text), text.len()).await;
            true
        }
        Message::Binary(bytes) => {
            dispatch(broadcaster, peer_id, messages::decode_bytes(&bytes), bytes.len()).await;
            true
        }
        // Axum answers pings automatically
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(peer_id = %peer_id, "Peer requested close");
            false
        }
    }
}

async fn dispatch(
    broadcaster: &Broadcaster,
    peer_id: PeerId,
    decoded: Result<Inbound, DecodeError>,
    len: usize,
) {
    match decoded {
        Ok(Inbound::Relay(envelope)) => {
            broadcaster.broadcast(&envelope, Some(peer_id)).await;
        }
        Ok(Inbound::Ignored { event }) => {
            tracing::trace!(peer_id = %peer_id, event = ?event, "Ignoring unrecognized event");
        }
        Err(e) => {
            tracing::warn!(peer_id = %peer_id, error = %e, bytes = len, "Dropping malformed frame");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::hub::ConnectionHub;
    use crate::websocket::messages::Envelope;

    async fn setup() -> (Broadcaster, PeerId, mpsc::Receiver<Frame>) {
        let hub = Arc::new(ConnectionHub::default());
        let broadcaster = Broadcaster::new(Arc::clone(&hub));

        let (sender, _sender_rx) = Peer::new(8);
        let sender_id = sender.id();
        hub.add(Arc::new(sender)).await;

        let (other, other_rx) = Peer::new(8);
        hub.add(Arc::new(other)).await;

        (broadcaster, sender_id, other_rx)
    }

    #[tokio::test]
    async fn test_text_message_is_relayed() {
        let (broadcaster, sender_id, mut rx) = setup().await;

        let keep_open = handle_ws_message(
            &broadcaster,
            sender_id,
            Message::Text(r#"{"event":"message","message":"hi"}"#.to_string()),
        )
        .await;

        assert!(keep_open);
        let frame = rx.try_recv().unwrap();
        let envelope: Envelope = serde_json::from_str(&frame).unwrap();
        assert_eq!(envelope, Envelope::message("hi"));
    }

    #[tokio::test]
    async fn test_malformed_frame_keeps_connection() {
        let (broadcaster, sender_id, mut rx) = setup().await;

        let keep_open =
            handle_ws_message(&broadcaster, sender_id, Message::Text("{oops".to_string())).await;

        assert!(keep_open);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unknown_event_is_dropped() {
        let (broadcaster, sender_id, mut rx) = setup().await;

        let keep_open = handle_ws_message(
            &broadcaster,
            sender_id,
            Message::Text(r#"{"event":"typing","message":"..."}"#.to_string()),
        )
        .await;

        assert!(keep_open);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_binary_json_is_relayed() {
        let (broadcaster, sender_id, mut rx) = setup().await;

        let keep_open = handle_ws_message(
            &broadcaster,
            sender_id,
            Message::Binary(br#"{"event":"connection","message":"joined"}"#.to_vec()),
        )
        .await;

        assert!(keep_open);
        let envelope: Envelope = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(envelope, Envelope::connection("joined"));
    }

    #[tokio::test]
    async fn test_close_ends_loop() {
        let (broadcaster, sender_id, _rx) = setup().await;
        assert!(!handle_ws_message(&broadcaster, sender_id, Message::Close(None)).await);
        assert!(handle_ws_message(&broadcaster, sender_id, Message::Ping(vec![1])).await);
    }
}
