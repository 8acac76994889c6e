//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default pause between lease attempts in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Base URL of the Firecast API
    pub server_url: String,
    /// Shared secret sent as a bearer token
    pub secret: String,
    /// Pause between lease attempts
    pub poll_interval: Duration,
    /// Timeout for calls to the Firecast API
    pub request_timeout: Duration,
    /// Directory for downloaded audio
    pub work_dir: PathBuf,
    /// yt-dlp executable name or path
    pub ytdlp_path: String,
    /// Passed to `yt-dlp --audio-quality`
    pub audio_quality: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".to_string(),
            secret: String::new(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            request_timeout: Duration::from_secs(10),
            work_dir: PathBuf::from("downloads"),
            ytdlp_path: "yt-dlp".to_string(),
            audio_quality: "192K".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            server_url: std::env::var("SERVER_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            secret: std::env::var("FIRECAST_SECRET").unwrap_or_default(),
            poll_interval: Duration::from_secs(
                std::env::var("WORKER_POLL_INTERVAL")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            ),
            request_timeout: Duration::from_secs(
                std::env::var("WORKER_REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("downloads")),
            ytdlp_path: std::env::var("YTDLP_PATH").unwrap_or_else(|_| "yt-dlp".to_string()),
            audio_quality: std::env::var("WORKER_AUDIO_QUALITY")
                .unwrap_or_else(|_| "192K".to_string()),
        }
    }
}
