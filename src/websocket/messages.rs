//! Relay Envelope Protocol
//!
//! Defines the wire envelope exchanged with peers and the lenient decoding
//! rules applied to inbound frames.
//!
//! ```text
//! { "event": "connection" | "message", "message": "<string>" }
//! ```
//!
//! Frames carrying any other `event` are ignored without error. Frames that
//! cannot be decoded at all are reported as [`DecodeError`] so the caller can
//! log them, but they never terminate the connection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

/// The two envelope kinds the relay forwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A peer announcing its presence
    Connection,
    /// A regular chat message
    Message,
}

impl EventKind {
    /// Parse a wire `event` value, returning `None` for unrecognized kinds
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "connection" => Some(Self::Connection),
            "message" => Some(Self::Message),
            _ => None,
        }
    }

    /// Wire name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Message => "message",
        }
    }
}

/// Unit of exchange between the relay and its peers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Envelope {
    /// Envelope kind
    pub event: EventKind,
    /// Free-text payload
    pub message: String,
}

impl Envelope {
    /// Create a `message` envelope
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            event: EventKind::Message,
            message: text.into(),
        }
    }

    /// Create a `connection` (presence) envelope
    pub fn connection(text: impl Into<String>) -> Self {
        Self {
            event: EventKind::Connection,
            message: text.into(),
        }
    }

    /// Serialize to the JSON wire encoding
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Result of decoding one inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A recognized envelope that should be relayed
    Relay(Envelope),
    /// A well-formed frame with an unrecognized or missing `event`
    Ignored {
        /// The `event` value, if one was present
        event: Option<String>,
    },
}

/// Errors produced while decoding an inbound frame
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Envelope must be a JSON object")]
    NotAnObject,

    #[error("Envelope with event '{event}' has no string 'message' field")]
    MissingMessage { event: &'static str },

    #[error("Binary frame is not valid UTF-8")]
    InvalidUtf8,
}

/// Decode a text frame into an [`Inbound`] outcome
pub fn decode(text: &str) -> Result<Inbound, DecodeError> {
    let value: Value = serde_json::from_str(text)?;
    let object = value.as_object().ok_or(DecodeError::NotAnObject)?;

    let event = match object.get("event") {
        Some(Value::String(event)) => event,
        Some(other) => {
            return Ok(Inbound::Ignored {
                event: Some(other.to_string()),
            })
        }
        None => return Ok(Inbound::Ignored { event: None }),
    };

    let Some(kind) = EventKind::parse(event) else {
        return Ok(Inbound::Ignored {
            event: Some(event.clone()),
        });
    };

    let message = object
        .get("message")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingMessage {
            event: kind.as_str(),
        })?;

    Ok(Inbound::Relay(Envelope {
        event: kind,
        message: message.to_string(),
    }))
}

/// Decode a binary frame, which is accepted when it carries UTF-8 JSON
pub fn decode_bytes(bytes: &[u8]) -> Result<Inbound, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;
    decode(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_message() {
        let inbound = decode(r#"{"event": "message", "message": "hi"}"#).unwrap();
        assert_eq!(inbound, Inbound::Relay(Envelope::message("hi")));
    }

    #[test]
    fn test_decode_connection() {
        let inbound = decode(r#"{"event":"connection","message":"New client connected"}"#).unwrap();
        match inbound {
            Inbound::Relay(envelope) => {
                assert_eq!(envelope.event, EventKind::Connection);
                assert_eq!(envelope.message, "New client connected");
            }
            _ => panic!("Expected Relay"),
        }
    }

    #[test]
    fn test_decode_ignores_unknown_event() {
        let inbound = decode(r#"{"event": "heartbeat", "message": "tick"}"#).unwrap();
        assert_eq!(
            inbound,
            Inbound::Ignored {
                event: Some("heartbeat".to_string())
            }
        );
    }

    #[test]
    fn test_decode_ignores_missing_event() {
        let inbound = decode(r#"{"message": "orphan"}"#).unwrap();
        assert_eq!(inbound, Inbound::Ignored { event: None });
    }

    #[test]
    fn test_decode_ignores_non_string_event() {
        let inbound = decode(r#"{"event": 7, "message": "x"}"#).unwrap();
        assert!(matches!(inbound, Inbound::Ignored { .. }));
    }

    #[test]
    fn test_decode_malformed_json() {
        let err = decode("not json at all").unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        let err = decode("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, DecodeError::NotAnObject));
    }

    #[test]
    fn test_decode_requires_string_message() {
        let err = decode(r#"{"event": "message", "message": 42}"#).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MissingMessage { event: "message" }
        ));
    }

    #[test]
    fn test_decode_bytes_rejects_invalid_utf8() {
        let err = decode_bytes(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidUtf8));

        let inbound = decode_bytes(br#"{"event":"message","message":"bin"}"#).unwrap();
        assert_eq!(inbound, Inbound::Relay(Envelope::message("bin")));
    }

    #[test]
    fn test_encode_wire_shape() {
        let json = Envelope::message("ping").encode().unwrap();
        assert_eq!(json, r#"{"event":"message","message":"ping"}"#);

        let json = Envelope::connection("hello").encode().unwrap();
        assert!(json.contains("\"event\":\"connection\""));
    }
}
