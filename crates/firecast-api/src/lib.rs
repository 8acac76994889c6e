//! Axum HTTP API for the Firecast job queue.
//!
//! This crate provides:
//! - Job intake and dispatch endpoints (`/job/add`, `/job/get`, `/job/done`, `/job/fail`)
//! - Shared-secret bearer authentication
//! - Health, status and playlist lookup endpoints
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, QueueBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
