//! HTTP routes
//!
//! - `POST /start-camera-stream` - register a camera source
//! - `GET /camera-stream?cameraId=<id>` - live MJPEG stream of a camera
//! - `GET /ws` - signaling WebSocket
//! - `GET /health` - liveness probe
//! - Static files from the configured directory

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ws::WebSocketUpgrade, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::camera::{CameraError, CameraRegistry, CameraSource};
use crate::server::config::ServerConfig;
use crate::signaling::{serve_socket, SignalingHub};
use crate::stream::{self, StreamError};

/// Body of a failed stream request when the transcoder cannot start
pub const SPAWN_FAILED_BODY: &str = "Failed to start camera stream";

/// Body of a stream request for an unknown camera
pub const NOT_FOUND_BODY: &str = "Camera not found";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Registered camera sources
    pub cameras: Arc<CameraRegistry>,
    /// Signaling connections and rooms
    pub hub: Arc<SignalingHub>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create fresh state for `config`
    pub fn new(config: ServerConfig) -> Self {
        let cameras = Arc::new(CameraRegistry::new());
        let hub = Arc::new(SignalingHub::new(Arc::clone(&cameras)));

        Self {
            cameras,
            hub,
            config: Arc::new(config),
        }
    }
}

/// Build the HTTP router
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/start-camera-stream", post(start_camera_stream))
        .route("/camera-stream", get(camera_stream))
        .route("/ws", get(signaling_socket))
        .route("/health", get(health_check));

    if let Some(dir) = &state.config.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

async fn start_camera_stream(State(state): State<AppState>, body: Bytes) -> Response {
    let source = serde_json::from_slice::<Value>(&body)
        .map_err(|_| CameraError::InvalidRegistration)
        .and_then(|value| CameraSource::from_json(&value));

    let source = match source {
        Ok(source) => source,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected camera registration");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
                .into_response();
        }
    };

    state.cameras.register(source).await;
    state.hub.announce_cameras().await;

    Json(json!({ "success": true })).into_response()
}

#[derive(Debug, Deserialize)]
struct StreamQuery {
    #[serde(rename = "cameraId", default)]
    camera_id: String,
}

async fn camera_stream(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Response {
    let camera_id = query.camera_id;

    match stream::open_stream(&state.cameras, &camera_id, &state.config.transcoder).await {
        Ok(stream) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, stream::CONTENT_TYPE),
                (header::CONNECTION, "close"),
                (header::PRAGMA, "no-cache"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            stream.into_body(),
        )
            .into_response(),
        Err(StreamError::Camera(_)) => {
            tracing::debug!(camera_id = %camera_id, "Stream requested for unknown camera");
            (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
        }
        Err(e) => {
            tracing::error!(camera_id = %camera_id, error = %e, "Failed to start camera stream");
            (StatusCode::INTERNAL_SERVER_ERROR, SPAWN_FAILED_BODY).into_response()
        }
    }
}

async fn signaling_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let hub = Arc::clone(&state.hub);
    ws.on_upgrade(move |socket| serve_socket(socket, hub))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
