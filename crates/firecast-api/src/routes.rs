//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{add_job, complete_job, fail_job, get_job, healthz, list_playlists, queue_status};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    // Authenticated through the `Authenticated` extractor in each handler
    let job_routes = Router::new()
        .route("/job/add", post(add_job))
        .route("/job/get", get(get_job))
        .route("/job/done", post(complete_job))
        .route("/job/fail", post(fail_job))
        .route("/playlists", get(list_playlists));

    let public_routes = Router::new()
        .route("/health", get(healthz))
        .route("/healthz", get(healthz))
        .route("/status", get(queue_status));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(job_routes)
        .merge(public_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn(request_id))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
