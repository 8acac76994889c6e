//! AzuraCast client error types.

use thiserror::Error;

pub type AzuraCastResult<T> = Result<T, AzuraCastError>;

#[derive(Debug, Error)]
pub enum AzuraCastError {
    #[error("AzuraCast is not configured: {0}")]
    NotConfigured(String),

    /// Non-success status from AzuraCast. The body is kept verbatim.
    #[error("AzuraCast API error: {status} {body}")]
    Upstream { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AzuraCastError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            AzuraCastError::Network(_) => true,
            AzuraCastError::Upstream { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
