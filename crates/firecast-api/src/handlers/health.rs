//! Health check handler.

use axum::extract::State;
use axum::Json;
use tracing::error;

use firecast_models::HealthResponse;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Health check endpoint. Fails when the queue store is unreachable.
pub async fn healthz(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    if let Err(e) = state.queue.ping().await {
        error!("Health check failed: {}", e);
        return Err(ApiError::internal("Store connection failed"));
    }

    Ok(Json(HealthResponse {
        status: true,
        message: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
