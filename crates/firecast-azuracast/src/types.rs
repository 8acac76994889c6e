//! AzuraCast request/response types.

use serde::{Deserialize, Serialize};

/// One entry of the station playlist listing. Entries missing either field
/// are skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistEntry {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Media upload body.
#[derive(Debug, Clone, Serialize)]
pub struct UploadRequest {
    /// File name inside the station media folder
    pub path: String,
    /// Base64-encoded file contents
    pub file: String,
}

/// Media upload response; only the song id is used.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub id: Option<i64>,
}

/// Body of the media update call that attaches a playlist.
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistAssignment {
    pub playlists: Vec<serde_json::Value>,
}

impl PlaylistAssignment {
    /// AzuraCast expects the playlist object followed by a literal `0`.
    pub fn single(playlist_id: i64) -> Self {
        Self {
            playlists: vec![serde_json::json!({ "id": playlist_id }), serde_json::json!(0)],
        }
    }
}
