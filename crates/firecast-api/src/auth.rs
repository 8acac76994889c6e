//! Shared-secret authentication.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::header::AUTHORIZATION;
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

/// Marker extractor for requests carrying the configured secret.
///
/// The header may be `Bearer <secret>` or the bare secret.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated;

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Authorization required"))?;

        let token = header.strip_prefix("Bearer ").unwrap_or(header);

        // An unset secret must not accept an empty token.
        if state.config.secret.is_empty() || token != state.config.secret {
            warn!(path = %parts.uri.path(), "Rejected request with invalid secret");
            return Err(ApiError::unauthorized("Invalid secret"));
        }

        Ok(Authenticated)
    }
}
