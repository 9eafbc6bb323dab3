use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Extension;
use axum::Json;
use curriculum::catalog::CatalogRepository;
use curriculum::resources::{portal_router, FileStorage, ResourceService};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::info;

pub(crate) fn with_portal_routes<R, S>(service: Arc<ResourceService<R, S>>) -> axum::Router
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    portal_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

/// Serve the media root under the path part of `media_url`, so stored `file_url`s resolve. A
/// `media_url` on another host mounts nothing.
pub(crate) fn with_media_files(
    router: axum::Router,
    media_root: &Path,
    media_url: &str,
) -> axum::Router {
    match media_mount(media_url) {
        Some(mount) => {
            info!(%mount, root = %media_root.display(), "serving media files");
            router.nest_service(&mount, ServeDir::new(media_root))
        }
        None => router,
    }
}

fn media_mount(media_url: &str) -> Option<String> {
    let path = media_url.trim().trim_end_matches('/');
    (path.starts_with('/') && path.len() > 1).then(|| path.to_string())
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
