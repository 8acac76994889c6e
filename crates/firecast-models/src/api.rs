//! HTTP request and response bodies.
//!
//! Every endpoint has a closed set of shapes: a success payload defined
//! here or in [`crate::job`], or an [`ErrorResponse`]. Missing request
//! fields deserialize to their empty defaults so the handlers can report
//! them as validation errors instead of JSON errors.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::JobId;

/// Playlist name to playlist id, as listed by the radio automation API.
pub type Playlists = BTreeMap<String, i64>;

/// Body of `POST /job/add`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobRequest {
    /// Source media URL
    #[serde(default, alias = "videoUrl")]
    pub url: String,
    /// Target playlist (must be non-zero)
    #[serde(default)]
    pub playlist_id: i64,
}

impl SubmitJobRequest {
    pub fn new(url: impl Into<String>, playlist_id: i64) -> Self {
        Self {
            url: url.into(),
            playlist_id,
        }
    }
}

/// Success body of `POST /job/add`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SubmitJobResponse {
    pub status: bool,
    pub message: String,
    #[serde(alias = "uuid")]
    pub id: JobId,
}

impl SubmitJobResponse {
    pub fn ok(id: JobId) -> Self {
        Self {
            status: true,
            message: "ok".to_string(),
            id,
        }
    }
}

/// Body of `POST /job/done` and `POST /job/fail`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct JobIdRequest {
    #[serde(default, alias = "uuid")]
    pub id: String,
}

impl JobIdRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Success body of the terminal-transition endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AckResponse {
    pub status: bool,
    pub message: String,
}

impl AckResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: message.into(),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
    pub status: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
        }
    }
}

/// Body of `GET /healthz`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    pub status: bool,
    pub message: String,
    pub version: String,
}
