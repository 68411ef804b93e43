//! WebSocket Relay Core
//!
//! Tracks live peer connections and fans every message out to all peers
//! except the one that sent it.
//!
//! ## Architecture
//!
//! - **Peer**: handle to one connection with a bounded outbound queue
//! - **ConnectionHub**: registry of live peers
//! - **Broadcaster**: encodes an envelope once and queues it for every other peer
//! - **Handler**: WebSocket upgrade and the per-peer receive loop
//! - **Messages**: the relay envelope and its decoding rules
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:8080/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({event: 'connection', message: 'New client connected'}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   console.log('New message:', msg.message);
//! };
//! ```

mod broadcast;
mod handler;
mod hub;
mod messages;
mod peer;

pub use broadcast::{BroadcastReport, Broadcaster};
pub use handler::{handle_socket, handle_ws_message, websocket_handler};
pub use hub::{ConnectionHub, HubConfig};
pub use messages::{decode, decode_bytes, DecodeError, Envelope, EventKind, Inbound};
pub use peer::{Frame, Peer, PeerId, PeerState, SendError};
