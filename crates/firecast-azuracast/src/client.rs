//! AzuraCast HTTP client.

use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use firecast_models::Playlists;
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

use crate::error::{AzuraCastError, AzuraCastResult};
use crate::types::{PlaylistAssignment, PlaylistEntry, UploadRequest, UploadResponse};

/// Configuration for the AzuraCast client.
#[derive(Debug, Clone)]
pub struct AzuraCastConfig {
    /// Station host name, e.g. `radio.example.com`
    pub domain: String,
    /// Value sent in the `X-API-Key` header
    pub api_key: String,
    /// Station the media and playlists belong to
    pub station_id: u32,
    /// Request timeout
    pub timeout: Duration,
    /// Full base URL override (scheme included); defaults to `https://{domain}`
    pub base_url: Option<String>,
}

impl Default for AzuraCastConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            api_key: String::new(),
            station_id: 1,
            timeout: Duration::from_secs(30),
            base_url: None,
        }
    }
}

impl AzuraCastConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            domain: std::env::var("AZURACAST_DOMAIN").unwrap_or_default(),
            api_key: std::env::var("AZURACAST_API_KEY").unwrap_or_default(),
            station_id: std::env::var("AZURACAST_STATION_ID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            timeout: Duration::from_secs(
                std::env::var("AZURACAST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            base_url: std::env::var("AZURACAST_BASE_URL").ok(),
        }
    }

    /// Whether enough is set to talk to a station.
    pub fn is_configured(&self) -> bool {
        (!self.domain.is_empty() || self.base_url.is_some()) && !self.api_key.is_empty()
    }

    fn api_base(&self) -> String {
        match &self.base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}", self.domain),
        }
    }
}

/// Client for one AzuraCast station.
pub struct AzuraCastClient {
    http: Client,
    config: AzuraCastConfig,
}

impl AzuraCastClient {
    /// Create a new client.
    pub fn new(config: AzuraCastConfig) -> AzuraCastResult<Self> {
        if !config.is_configured() {
            return Err(AzuraCastError::NotConfigured(
                "AZURACAST_DOMAIN and AZURACAST_API_KEY must be set".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(AzuraCastError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> AzuraCastResult<Self> {
        Self::new(AzuraCastConfig::from_env())
    }

    pub fn config(&self) -> &AzuraCastConfig {
        &self.config
    }

    fn station_url(&self, path: &str) -> String {
        format!(
            "{}/api/station/{}/{}",
            self.config.api_base(),
            self.config.station_id,
            path
        )
    }

    /// List the station's playlists as a `{name: id}` map.
    pub async fn list_playlists(&self) -> AzuraCastResult<Playlists> {
        let url = self.station_url("playlists");
        debug!("Fetching playlists from {}", url);

        let response = self
            .http
            .get(&url)
            .header("X-API-Key", &self.config.api_key)
            .send()
            .await?;
        let response = check_status(response).await?;

        let entries: Vec<PlaylistEntry> = response.json().await?;
        let playlists: Playlists = entries
            .into_iter()
            .filter_map(|entry| Some((entry.name?, entry.id?)))
            .collect();

        debug!("Fetched {} playlists", playlists.len());
        Ok(playlists)
    }

    /// Upload a media file and return its song id.
    pub async fn upload_file(&self, path: &Path) -> AzuraCastResult<i64> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| AzuraCastError::invalid_response(format!("bad file name: {}", path.display())))?
            .to_string();

        let contents = tokio::fs::read(path).await?;
        let body = UploadRequest {
            path: file_name.clone(),
            file: BASE64.encode(&contents),
        };

        let response = self
            .http
            .post(self.station_url("files"))
            .header("X-API-Key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        let uploaded: UploadResponse = response.json().await?;
        let song_id = uploaded
            .id
            .ok_or_else(|| AzuraCastError::invalid_response("upload response has no song id"))?;

        info!("Uploaded {} ({} bytes) as song {}", file_name, contents.len(), song_id);
        Ok(song_id)
    }

    /// Attach an uploaded song to a playlist.
    pub async fn assign_playlist(&self, song_id: i64, playlist_id: i64) -> AzuraCastResult<()> {
        let response = self
            .http
            .put(self.station_url(&format!("file/{}", song_id)))
            .header("X-API-Key", &self.config.api_key)
            .json(&PlaylistAssignment::single(playlist_id))
            .send()
            .await?;
        check_status(response).await?;

        info!("Assigned song {} to playlist {}", song_id, playlist_id);
        Ok(())
    }
}

async fn check_status(response: Response) -> AzuraCastResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!("AzuraCast returned {}: {}", status, body);
    Err(AzuraCastError::Upstream {
        status: status.as_u16(),
        body,
    })
}
