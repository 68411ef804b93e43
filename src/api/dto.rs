//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::store::Notification;

// ============================================
// MESSAGE DTOs
// ============================================

/// Free-text message to relay to every peer
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PublishRequest {
    /// Text to relay
    pub message: String,
}

/// Live peer count
#[derive(Debug, Serialize, ToSchema)]
pub struct PeersResponse {
    pub count: usize,
}

/// Where new peers connect
#[derive(Debug, Serialize, ToSchema)]
pub struct EndpointResponse {
    /// WebSocket URL
    pub url: String,
}

// ============================================
// NOTIFICATION DTOs
// ============================================

/// Notification to store; the change feed relays it
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct NotificationRequest {
    /// Text to store and relay
    pub message: String,
}

/// Notification listing parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationListQuery {
    /// Only return notifications with a greater id
    #[serde(default)]
    pub after: Option<i64>,
    /// Maximum number of notifications (default 100, max 1000)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Page of stored notifications
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationListResponse {
    pub notifications: Vec<Notification>,
    /// Pass as `after` to fetch the next page
    pub next_cursor: i64,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,
    /// Live peer count
    pub peers: usize,
    /// "ok", "error" or "disabled"
    pub store: String,
    pub uptime_seconds: u64,
    pub version: String,
}
