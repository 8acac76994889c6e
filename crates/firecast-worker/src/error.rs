//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("yt-dlp not found: {0}")]
    YtDlpNotFound(String),

    /// Non-success response from the Firecast API.
    #[error("Server error: {status} {body}")]
    Server { status: u16, body: String },

    #[error("AzuraCast error: {0}")]
    AzuraCast(#[from] firecast_azuracast::AzuraCastError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn download_failed(msg: impl Into<String>) -> Self {
        Self::DownloadFailed(msg.into())
    }

    /// Check if this is a failure that no retry can fix.
    ///
    /// These are downloads where the source itself is inaccessible
    /// (private, removed, region or age restricted).
    pub fn is_permanent_failure(&self) -> bool {
        let WorkerError::DownloadFailed(msg) = self else {
            return false;
        };
        let msg = msg.to_lowercase();

        if msg.contains("private video") || msg.contains("video is private") {
            return true;
        }

        if msg.contains("video unavailable")
            || msg.contains("video is unavailable")
            || msg.contains("video not available")
            || msg.contains("video has been removed")
        {
            return true;
        }

        if msg.contains("age") && (msg.contains("restrict") || msg.contains("verif")) {
            return true;
        }

        if msg.contains("not available in your country") || msg.contains("blocked in your country")
        {
            return true;
        }

        msg.contains("unsupported url")
    }
}
