//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use firecast_models::QueueStats;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "firecast_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "firecast_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "firecast_http_requests_in_flight";

    // Queue gauges, refreshed on /status
    pub const QUEUE_PENDING: &str = "firecast_queue_pending";
    pub const QUEUE_LEASED: &str = "firecast_queue_leased";
    pub const QUEUE_DONE: &str = "firecast_queue_done";
    pub const QUEUE_FAILED: &str = "firecast_queue_failed";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", route_label(path).to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Update the queue size gauges.
pub fn set_queue_sizes(stats: &QueueStats) {
    gauge!(names::QUEUE_PENDING).set(stats.pending_count as f64);
    gauge!(names::QUEUE_LEASED).set(stats.leased_count as f64);
    gauge!(names::QUEUE_DONE).set(stats.done_count as f64);
    gauge!(names::QUEUE_FAILED).set(stats.fail_count as f64);
}

/// Collapse unknown paths so scanners cannot blow up label cardinality.
fn route_label(path: &str) -> &'static str {
    match path {
        "/job/add" => "/job/add",
        "/job/get" => "/job/get",
        "/job/done" => "/job/done",
        "/job/fail" => "/job/fail",
        "/status" => "/status",
        "/playlists" => "/playlists",
        "/health" | "/healthz" => "/healthz",
        "/metrics" => "/metrics",
        _ => "other",
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
