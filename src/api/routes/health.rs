//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (ready to serve traffic)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
#[utoipa::path(
    get,
    path = "/health/live",
    responses((status = 200, description = "Process is alive")),
    tag = "Health"
)]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness probe.
/// Returns 200 unless the notification store is enabled and failing.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Ready to accept peers"),
        (status = 503, description = "Notification store unavailable")
    ),
    tag = "Health"
)]
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    match check_store_health(&state) {
        StoreHealth::Ok | StoreHealth::Disabled => StatusCode::OK,
        StoreHealth::Error => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// GET /health
///
/// Full health status with component details.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Component status", body = HealthResponse)),
    tag = "Health"
)]
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store = check_store_health(&state);

    let overall_status = match store {
        StoreHealth::Error => "degraded",
        StoreHealth::Ok | StoreHealth::Disabled => "healthy",
    };

    Json(HealthResponse {
        status: overall_status.to_string(),
        peers: state.hub.len().await,
        store: store.as_str().to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

enum StoreHealth {
    Ok,
    Error,
    Disabled,
}

impl StoreHealth {
    fn as_str(&self) -> &'static str {
        match self {
            StoreHealth::Ok => "ok",
            StoreHealth::Error => "error",
            StoreHealth::Disabled => "disabled",
        }
    }
}

fn check_store_health(state: &AppState) -> StoreHealth {
    let Some(store) = &state.store else {
        return StoreHealth::Disabled;
    };

    match store.latest_id() {
        Ok(_) => StoreHealth::Ok,
        Err(e) => {
            tracing::warn!(error = %e, "Notification store health check failed");
            StoreHealth::Error
        }
    }
}
