//! API error types.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use firecast_azuracast::AzuraCastError;
use firecast_models::ErrorResponse;
use firecast_queue::QueueError;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned in place of store error text.
const STORE_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("AzuraCast error: {0}")]
    AzuraCast(#[from] AzuraCastError),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Queue(e) => match e {
                QueueError::Validation(_) => StatusCode::BAD_REQUEST,
                QueueError::NotFound(_) => StatusCode::NOT_FOUND,
                QueueError::Conflict { .. } => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::AzuraCast(AzuraCastError::Upstream { .. }) => StatusCode::BAD_GATEWAY,
            ApiError::AzuraCast(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Store failures never expose their text.
    fn message(&self) -> String {
        match self {
            ApiError::Unauthorized(msg) | ApiError::BadRequest(msg) | ApiError::Internal(msg) => {
                msg.clone()
            }
            ApiError::Queue(QueueError::Validation(msg)) => msg.clone(),
            ApiError::Queue(e) if e.is_store_error() => STORE_ERROR_MESSAGE.to_string(),
            ApiError::Queue(e) => e.to_string(),
            ApiError::AzuraCast(e @ AzuraCastError::Upstream { .. }) => e.to_string(),
            ApiError::AzuraCast(AzuraCastError::NotConfigured(_)) => {
                "AzuraCast is not configured".to_string()
            }
            ApiError::AzuraCast(AzuraCastError::Network(_)) => {
                "Failed to send request to AzuraCast".to_string()
            }
            ApiError::AzuraCast(_) => "Failed to parse AzuraCast response".to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(_: JsonRejection) -> Self {
        Self::BadRequest("Invalid JSON format".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = %status, "Request failed: {}", self);
        }

        (status, Json(ErrorResponse::new(self.message()))).into_response()
    }
}
