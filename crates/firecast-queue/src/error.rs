//! Queue error types.

use firecast_models::{JobId, JobState};
use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Job {id} is already {state}")]
    Conflict { id: JobId, state: JobState },

    #[error("Corrupt job record {id}: {reason}")]
    CorruptRecord { id: JobId, reason: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl QueueError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed(msg.into())
    }

    pub fn corrupt(id: &JobId, reason: impl Into<String>) -> Self {
        Self::CorruptRecord {
            id: id.clone(),
            reason: reason.into(),
        }
    }

    /// Errors caused by the underlying store rather than the caller.
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            QueueError::CorruptRecord { .. }
                | QueueError::ConnectionFailed(_)
                | QueueError::Store(_)
                | QueueError::Redis(_)
        )
    }
}
