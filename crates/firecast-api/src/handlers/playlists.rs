//! Playlist lookup handler.

use axum::extract::State;
use axum::Json;

use firecast_models::Playlists;

use crate::auth::Authenticated;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// List the station playlists as a `{name: id}` map.
pub async fn list_playlists(
    _auth: Authenticated,
    State(state): State<AppState>,
) -> ApiResult<Json<Playlists>> {
    let client = state
        .azuracast
        .as_ref()
        .ok_or_else(|| ApiError::internal("AzuraCast is not configured"))?;

    let playlists = client.list_playlists().await?;
    if playlists.is_empty() {
        return Err(ApiError::internal("No playlists found in AzuraCast"));
    }

    Ok(Json(playlists))
}
