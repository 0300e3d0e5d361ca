//! HTTP boundary: accept `{ url, format? }`, resolve it, answer with the
//! download link or a generic error.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::core::{MediaFormat, MediaRequest, Resolution};
use crate::error::{ErrorKind, ResolveError};
use crate::resolver::Resolver;

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
}

impl AppState {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VideoInfoRequest {
    #[serde(default)]
    pub url: Option<String>,
    /// `mp3` (default) or `mp4`
    #[serde(default)]
    pub format: Option<MediaFormat>,
}

impl From<VideoInfoRequest> for MediaRequest {
    fn from(body: VideoInfoRequest) -> Self {
        MediaRequest::new(body.url.unwrap_or_default(), body.format.unwrap_or_default())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfoResponse {
    pub title: String,
    pub thumbnail_url: String,
    pub download_url: String,
}

impl From<Resolution> for VideoInfoResponse {
    fn from(resolution: Resolution) -> Self {
        Self {
            title: resolution.info.title,
            thumbnail_url: resolution.info.thumbnail_url,
            download_url: resolution.selected.stream_url,
        }
    }
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        let status = match self.kind {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Unresolvable => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Resolve one URL. Dropping this future (client gone) cancels backend calls.
async fn get_video_info(
    State(state): State<AppState>,
    payload: Result<Json<VideoInfoRequest>, JsonRejection>,
) -> Response {
    let request: MediaRequest = match payload {
        Ok(Json(body)) => body.into(),
        Err(rejection) => {
            tracing::debug!(%rejection, "rejected request body");
            return ResolveError::invalid_request().into_response();
        }
    };

    match state.resolver.resolve(&request).await {
        Ok(resolution) => Json(VideoInfoResponse::from(resolution)).into_response(),
        Err(e) => {
            tracing::info!(kind = %e.kind, "request failed");
            e.into_response()
        }
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: AppState, cors: bool) -> Router {
    let app = Router::new()
        .route("/api/getVideoInfo", post(get_video_info))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// Bind `config.bind` and serve until Ctrl-C
pub async fn serve(config: &ServerConfig, resolver: Resolver) -> std::io::Result<()> {
    let app = router(AppState::new(resolver), config.cors);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
