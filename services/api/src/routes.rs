use crate::infra::{AppState, InMemoryAssetStore};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use job_board::board::{board_router, BoardStore, JobBoard, NotificationPublisher};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

pub(crate) fn with_service_routes<S, N>(
    board: Arc<JobBoard<S, N, InMemoryAssetStore>>,
) -> Router
where
    S: BoardStore + 'static,
    N: NotificationPublisher + 'static,
{
    board_router(board)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/assets/:key", get(asset_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Serve a previously uploaded logo, resume, or profile photo.
pub(crate) async fn asset_endpoint(
    Extension(assets): Extension<Arc<InMemoryAssetStore>>,
    Path(key): Path<String>,
) -> Response {
    match assets.fetch(&key) {
        Ok(Some(asset)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, asset.content_type)],
            asset.bytes,
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("asset {key} not found") })),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, %key, "asset lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}
