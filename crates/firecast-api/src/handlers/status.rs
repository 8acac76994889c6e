//! Queue status handler.

use axum::extract::State;
use axum::Json;

use firecast_models::QueueStats;

use crate::error::ApiResult;
use crate::metrics;
use crate::state::AppState;

/// Current queue sizes.
pub async fn queue_status(State(state): State<AppState>) -> ApiResult<Json<QueueStats>> {
    let stats = state.queue.status().await?;
    metrics::set_queue_sizes(&stats);
    Ok(Json(stats))
}
