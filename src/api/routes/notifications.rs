//! Notification Routes
//!
//! - POST /api/v1/notifications - Store a notification (relayed by the change feed)
//! - GET /api/v1/notifications - List stored notifications

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{NotificationListQuery, NotificationListResponse, NotificationRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::messages::validate_message;
use crate::api::state::AppState;
use crate::store::{Notification, NotificationStore};

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

/// POST /api/v1/notifications
///
/// Store a notification. Peers receive it once the change feed picks up the
/// new row.
#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    request_body = NotificationRequest,
    responses(
        (status = 201, description = "Notification stored", body = Notification),
        (status = 400, description = "Message too large", body = crate::api::error::ErrorResponse),
        (status = 503, description = "Notification store disabled", body = crate::api::error::ErrorResponse)
    ),
    tag = "Notifications"
)]
pub async fn create_notification(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NotificationRequest>,
) -> ApiResult<(StatusCode, Json<Notification>)> {
    validate_message(&state, &req.message)?;
    let store = require_store(&state)?;

    let notification = store.insert(&req.message)?;
    tracing::debug!(notification_id = notification.id, "Stored notification");

    Ok((StatusCode::CREATED, Json(notification)))
}

/// GET /api/v1/notifications
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(NotificationListQuery),
    responses(
        (status = 200, description = "Stored notifications, oldest first", body = NotificationListResponse),
        (status = 503, description = "Notification store disabled", body = crate::api::error::ErrorResponse)
    ),
    tag = "Notifications"
)]
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NotificationListQuery>,
) -> ApiResult<Json<NotificationListResponse>> {
    let store = require_store(&state)?;

    let after = params.after.unwrap_or(0);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let notifications = store.since(after, limit)?;
    let next_cursor = notifications.last().map(|n| n.id).unwrap_or(after);

    Ok(Json(NotificationListResponse {
        notifications,
        next_cursor,
    }))
}

fn require_store(state: &AppState) -> ApiResult<&Arc<NotificationStore>> {
    state
        .store
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("Notification store is disabled".to_string()))
}
