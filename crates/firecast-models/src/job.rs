//! Job definitions for queue processing.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Where a job currently sits in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting in the pending index
    #[default]
    Pending,
    /// Checked out by a worker under a lease
    Leased,
    /// Completed successfully (terminal)
    Done,
    /// Failed for good (terminal)
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Leased => "leased",
            JobState::Done => "done",
            JobState::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result reported by a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Done,
    Failed,
}

impl JobOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobOutcome::Done => "done",
            JobOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job handed to a worker by a lease grant.
///
/// `retries` is the post-increment attempt count, so the first lease of a
/// job reports `1`. `last_attempt_at` only moves when the sweeper requeues
/// an expired lease; a plain lease grant leaves it untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeasedJob {
    /// Job ID
    #[serde(alias = "uuid")]
    pub id: JobId,
    /// Source media URL
    #[serde(alias = "videoUrl")]
    pub url: String,
    /// Target playlist
    pub playlist_id: i64,
    /// Attempt number of this lease (1-based)
    pub retries: u32,
    /// Submission time (unix seconds)
    pub added_at: i64,
    /// Last requeue time (unix seconds)
    pub last_attempt_at: i64,
}

/// Cardinalities of the four queue indexes.
///
/// Each count is read independently, so a snapshot taken while other
/// requests are in flight may not add up exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub pending_count: u64,
    pub leased_count: u64,
    pub done_count: u64,
    pub fail_count: u64,
}

impl QueueStats {
    /// Sum of all four indexes.
    pub fn total(&self) -> u64 {
        self.pending_count + self.leased_count + self.done_count + self.fail_count
    }
}
