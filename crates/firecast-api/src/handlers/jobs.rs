//! Job intake and dispatch handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::debug;

use firecast_models::{AckResponse, JobIdRequest, LeasedJob, SubmitJobRequest, SubmitJobResponse};

use crate::auth::Authenticated;
use crate::error::ApiResult;
use crate::state::AppState;

/// Response of `GET /job/get`.
#[derive(Debug)]
pub enum LeaseResponse {
    Leased(LeasedJob),
    /// Nothing pending; poll again later.
    Empty,
}

impl IntoResponse for LeaseResponse {
    fn into_response(self) -> Response {
        match self {
            LeaseResponse::Leased(job) => (StatusCode::OK, Json(job)).into_response(),
            LeaseResponse::Empty => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// Submit a job.
pub async fn add_job(
    _auth: Authenticated,
    State(state): State<AppState>,
    payload: Result<Json<SubmitJobRequest>, JsonRejection>,
) -> ApiResult<Json<SubmitJobResponse>> {
    let Json(request) = payload?;
    let id = state.queue.submit(&request.url, request.playlist_id).await?;
    Ok(Json(SubmitJobResponse::ok(id)))
}

/// Lease the oldest pending job.
pub async fn get_job(
    _auth: Authenticated,
    State(state): State<AppState>,
) -> ApiResult<LeaseResponse> {
    match state.queue.lease().await? {
        Some(job) => Ok(LeaseResponse::Leased(job)),
        None => {
            debug!("No pending jobs");
            Ok(LeaseResponse::Empty)
        }
    }
}

/// Mark a job as done.
pub async fn complete_job(
    _auth: Authenticated,
    State(state): State<AppState>,
    payload: Result<Json<JobIdRequest>, JsonRejection>,
) -> ApiResult<Json<AckResponse>> {
    let Json(request) = payload?;
    state.queue.complete(&request.id).await?;
    Ok(Json(AckResponse::ok("Job marked as done")))
}

/// Mark a job as failed.
pub async fn fail_job(
    _auth: Authenticated,
    State(state): State<AppState>,
    payload: Result<Json<JobIdRequest>, JsonRejection>,
) -> ApiResult<Json<AckResponse>> {
    let Json(request) = payload?;
    state.queue.fail(&request.id).await?;
    Ok(Json(AckResponse::ok("Job marked as failed")))
}
