//! Relay Client
//!
//! A WebSocket peer speaking the relay envelope protocol. Used by the
//! `wsrelay-client` binary and by the integration tests.

use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};

use crate::websocket::{decode, DecodeError, Envelope, Inbound};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Errors raised by [`RelayClient`]
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Undecodable envelope: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to encode envelope: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One peer connection to a relay
pub struct RelayClient {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl RelayClient {
    /// Connect to a relay at `url` (e.g. `ws://localhost:8080/ws`)
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (ws, _) = connect_async(url).await?;
        let (sink, stream) = ws.split();
        Ok(Self { sink, stream })
    }

    /// Send an envelope
    pub async fn send(&mut self, envelope: &Envelope) -> Result<(), ClientError> {
        let text = envelope.encode()?;
        self.send_raw(text).await
    }

    /// Send an arbitrary text frame
    pub async fn send_raw(&mut self, text: impl Into<String>) -> Result<(), ClientError> {
        self.sink.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Next relayed envelope
    ///
    /// Frames with unrecognized events are skipped. Returns `None` once the
    /// relay closes the connection.
    pub async fn next_envelope(&mut self) -> Option<Result<Envelope, ClientError>> {
        while let Some(result) = self.stream.next().await {
            let text = match result {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            };

            match decode(&text) {
                Ok(Inbound::Relay(envelope)) => return Some(Ok(envelope)),
                Ok(Inbound::Ignored { .. }) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }

    /// Close the connection
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.sink.send(Message::Close(None)).await?;
        Ok(())
    }
}
