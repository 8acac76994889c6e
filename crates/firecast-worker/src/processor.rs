//! Turns one leased job into a playlist entry.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use firecast_azuracast::AzuraCastClient;
use firecast_models::LeasedJob;

use crate::download::Downloader;
use crate::error::WorkerResult;

/// Download, upload, then assign to the job's playlist.
#[derive(Clone)]
pub struct JobProcessor {
    downloader: Downloader,
    azuracast: Arc<AzuraCastClient>,
}

impl JobProcessor {
    pub fn new(downloader: Downloader, azuracast: Arc<AzuraCastClient>) -> Self {
        Self {
            downloader,
            azuracast,
        }
    }

    /// Process a job and return the AzuraCast song id.
    ///
    /// The downloaded file is removed whether or not the upload succeeds.
    pub async fn process(&self, job: &LeasedJob) -> WorkerResult<i64> {
        let path = self.downloader.download(job).await?;

        let result = self.upload_and_assign(job, &path).await;

        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(job_id = %job.id, "Failed to remove {}: {}", path.display(), e);
        }

        result
    }

    async fn upload_and_assign(&self, job: &LeasedJob, path: &Path) -> WorkerResult<i64> {
        let song_id = self.azuracast.upload_file(path).await?;
        self.azuracast
            .assign_playlist(song_id, job.playlist_id)
            .await?;

        info!(
            job_id = %job.id,
            song_id,
            playlist_id = job.playlist_id,
            "Job added to playlist"
        );
        Ok(song_id)
    }
}
