//! OpenAPI Documentation
//!
//! OpenAPI document for the wsrelay HTTP surface, served at
//! `/api-docs/openapi.json` and browsable through Swagger UI at `/docs`.

use utoipa::OpenApi;

use crate::api::dto::{
    EndpointResponse, HealthResponse, NotificationListResponse, NotificationRequest,
    PeersResponse, PublishRequest,
};
use crate::api::error::{ErrorBody, ErrorResponse};
use crate::api::routes;
use crate::store::Notification;
use crate::websocket::BroadcastReport;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "wsrelay API",
        description = "Inject messages into the WebSocket relay. Peers connect to /ws and exchange {\"event\", \"message\"} envelopes."
    ),
    paths(
        routes::messages::publish_message,
        routes::messages::peer_count,
        routes::messages::endpoint,
        routes::notifications::create_notification,
        routes::notifications::list_notifications,
        routes::health::liveness,
        routes::health::readiness,
        routes::health::full_health,
    ),
    components(schemas(
        PublishRequest,
        BroadcastReport,
        PeersResponse,
        EndpointResponse,
        NotificationRequest,
        Notification,
        NotificationListResponse,
        HealthResponse,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "Relay", description = "Message relay"),
        (name = "Notifications", description = "Persistent notification store"),
        (name = "Health", description = "Service health checks"),
    )
)]
pub struct ApiDoc;

/// Path the OpenAPI document is served at
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// Swagger UI mount point
pub const SWAGGER_UI_PATH: &str = "/docs";
