//! Shared data models for the Firecast job queue.
//!
//! This crate provides Serde-serializable types for:
//! - Job identifiers, states and leased job payloads
//! - Queue status snapshots
//! - Request/response bodies of every HTTP endpoint

pub mod api;
pub mod job;

// Re-export common types
pub use api::{
    AckResponse, ErrorResponse, HealthResponse, JobIdRequest, Playlists, SubmitJobRequest,
    SubmitJobResponse,
};
pub use job::{JobId, JobOutcome, JobState, LeasedJob, QueueStats};
