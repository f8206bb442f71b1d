//! HTTP surface: the intercepted fetch path plus the control side channels.

use axum::{
    Json, Router,
    body::Body,
    extract::{Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::control::{self, ControlMessage};
use crate::gateway::{AssetRequest, Decision, Gateway, ServedOutcome};
use crate::notify::{self, Notification};
use crate::sync;

/// Build the gateway router.
pub fn create_router(gateway: Gateway) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/_gateway/message", post(message))
        .route("/_gateway/push", post(push))
        .route("/_gateway/notification-click", post(notification_click))
        .route("/_gateway/sync", post(sync_event))
        .fallback(serve_asset)
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: String,
    controlling: bool,
}

async fn health(State(gateway): State<Gateway>) -> Json<Health> {
    Json(Health {
        status: "ok",
        version: gateway.version().to_string(),
        controlling: gateway.is_controlling(),
    })
}

async fn message(State(gateway): State<Gateway>, Json(message): Json<ControlMessage>) -> Response {
    match control::handle_message(&gateway, message).await {
        Ok(reply) => Json(reply).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

async fn push(body: bytes::Bytes) -> Response {
    match notify::parse_push(&body) {
        Ok(notification) => Json(notification).into_response(),
        Err(err) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    }
}

#[derive(Deserialize)]
struct ClickEvent {
    #[serde(default)]
    action: Option<String>,
    notification: Notification,
}

#[derive(Serialize)]
struct ClickOutcome {
    open: Option<String>,
}

async fn notification_click(Json(event): Json<ClickEvent>) -> Json<ClickOutcome> {
    let open = notify::notification_click(event.action.as_deref(), &event.notification);
    Json(ClickOutcome { open })
}

#[derive(Deserialize)]
struct SyncEvent {
    tag: String,
}

#[derive(Serialize)]
struct SyncOutcome {
    replayed: u64,
}

async fn sync_event(Json(event): Json<SyncEvent>) -> Json<SyncOutcome> {
    let replayed = sync::handle_sync(&event.tag).await;
    Json(SyncOutcome { replayed })
}

/// The intercepted fetch path: every request not claimed by a control
/// route lands here and is resolved against the upstream origin.
async fn serve_asset(State(gateway): State<Gateway>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let path_and_query = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    let target = match wayfare_client::resolve(gateway.upstream(), path_and_query) {
        Ok(url) => url,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };

    let accept = parts
        .headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let asset_request = AssetRequest { method: parts.method.as_str().to_string(), url: target, accept };

    match gateway.handle(&asset_request).await {
        Decision::Serve(outcome) => served(outcome),
        Decision::PassThrough => pass_through(&gateway, &asset_request, body).await,
    }
}

fn served(outcome: ServedOutcome) -> Response {
    // The background refresh, if any, finishes on its own.
    let ServedOutcome { response, refresh: _ } = outcome;

    let mut builder = Response::builder()
        .status(StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY))
        .header("x-wayfare-source", response.source.as_str());
    if let Some(content_type) = &response.content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response())
}

async fn pass_through(gateway: &Gateway, request: &AssetRequest, body: Body) -> Response {
    let limit = gateway.config().max_bytes;
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::PAYLOAD_TOO_LARGE.into_response(),
    };

    match gateway.network().forward(&request.method, &request.url, bytes).await {
        Ok(relayed) => {
            let mut builder =
                Response::builder().status(StatusCode::from_u16(relayed.status).unwrap_or(StatusCode::BAD_GATEWAY));
            if let Some(content_type) = &relayed.content_type {
                builder = builder.header(header::CONTENT_TYPE, content_type);
            }
            builder
                .body(Body::from(relayed.body))
                .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response())
        }
        Err(err) => (StatusCode::BAD_GATEWAY, err.to_string()).into_response(),
    }
}
