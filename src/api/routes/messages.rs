//! Message Routes
//!
//! Inject messages into the relay and inspect it.
//!
//! - POST /api/v1/messages - Relay a message to every peer
//! - GET /api/v1/peers - Live peer count
//! - GET /api/v1/endpoint - WebSocket endpoint descriptor

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{EndpointResponse, PeersResponse, PublishRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::websocket::BroadcastReport;

/// POST /api/v1/messages
///
/// Relay a message to every connected peer. The HTTP caller is not a peer,
/// so nobody is excluded.
#[utoipa::path(
    post,
    path = "/api/v1/messages",
    request_body = PublishRequest,
    responses(
        (status = 202, description = "Message queued for every live peer", body = BroadcastReport),
        (status = 400, description = "Message too large", body = crate::api::error::ErrorResponse)
    ),
    tag = "Relay"
)]
pub async fn publish_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PublishRequest>,
) -> ApiResult<(StatusCode, Json<BroadcastReport>)> {
    validate_message(&state, &req.message)?;

    let report = state.broadcaster.publish(req.message).await;
    tracing::debug!(delivered = report.delivered, "Relayed HTTP message");

    Ok((StatusCode::ACCEPTED, Json(report)))
}

/// GET /api/v1/peers
#[utoipa::path(
    get,
    path = "/api/v1/peers",
    responses((status = 200, description = "Live peer count", body = PeersResponse)),
    tag = "Relay"
)]
pub async fn peer_count(State(state): State<Arc<AppState>>) -> Json<PeersResponse> {
    Json(PeersResponse {
        count: state.hub.len().await,
    })
}

/// GET /api/v1/endpoint
#[utoipa::path(
    get,
    path = "/api/v1/endpoint",
    responses((status = 200, description = "WebSocket endpoint peers connect to", body = EndpointResponse)),
    tag = "Relay"
)]
pub async fn endpoint(State(state): State<Arc<AppState>>) -> Json<EndpointResponse> {
    Json(EndpointResponse {
        url: state.config.endpoint_url(),
    })
}

/// Reject messages larger than a peer would be allowed to send
pub(crate) fn validate_message(state: &AppState, message: &str) -> ApiResult<()> {
    let max = state.hub.config().max_message_bytes;
    if message.len() > max {
        return Err(ApiError::Validation(format!(
            "Message exceeds maximum length of {} bytes",
            max
        )));
    }
    Ok(())
}
