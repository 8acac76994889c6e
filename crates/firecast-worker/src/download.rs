//! Audio extraction via yt-dlp.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use firecast_models::LeasedJob;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};

/// Runs yt-dlp to fetch a job's audio into the work directory.
#[derive(Debug, Clone)]
pub struct Downloader {
    ytdlp: PathBuf,
    work_dir: PathBuf,
    audio_quality: String,
}

impl Downloader {
    /// Resolve the yt-dlp executable and make sure the work directory exists.
    pub async fn new(config: &WorkerConfig) -> WorkerResult<Self> {
        let ytdlp = which::which(&config.ytdlp_path)
            .map_err(|e| WorkerError::YtDlpNotFound(format!("{}: {}", config.ytdlp_path, e)))?;
        tokio::fs::create_dir_all(&config.work_dir).await?;

        debug!("Using yt-dlp at {}", ytdlp.display());

        Ok(Self {
            ytdlp,
            work_dir: config.work_dir.clone(),
            audio_quality: config.audio_quality.clone(),
        })
    }

    /// Where the audio for `job` ends up once yt-dlp succeeds.
    pub fn output_path(&self, job: &LeasedJob) -> PathBuf {
        self.work_dir.join(format!("{}.mp3", job.id))
    }

    /// Download the job's URL as mp3 and return the file path.
    pub async fn download(&self, job: &LeasedJob) -> WorkerResult<PathBuf> {
        let template = self.work_dir.join(format!("{}.%(ext)s", job.id));

        info!(job_id = %job.id, "Downloading audio from {}", job.url);

        let output = Command::new(&self.ytdlp)
            .args(["--no-playlist", "--no-progress", "--format", "bestaudio/best"])
            .args(["--extract-audio", "--audio-format", "mp3"])
            .args(["--audio-quality", &self.audio_quality])
            .arg("--output")
            .arg(&template)
            .arg(&job.url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last_line = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("yt-dlp exited with an error");
            return Err(WorkerError::download_failed(last_line.trim()));
        }

        let path = self.output_path(job);
        if !file_exists(&path).await {
            return Err(WorkerError::download_failed(format!(
                "yt-dlp finished but {} was not created",
                path.display()
            )));
        }

        Ok(path)
    }
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Stand-in yt-dlp that writes a small file at the `--output` template.
    pub const SUCCEEDS: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--output" ]; then out="$2"; shift; fi
  shift
done
file=$(printf '%s' "$out" | sed 's/%(ext)s/mp3/')
printf 'audio' > "$file"
"#;

    pub const UNAVAILABLE: &str = r#"#!/bin/sh
echo "[youtube] u1: Downloading webpage" >&2
echo "ERROR: [youtube] u1: Video unavailable" >&2
exit 1
"#;

    pub const PRODUCES_NOTHING: &str = "#!/bin/sh\nexit 0\n";

    pub fn fake_ytdlp(dir: &Path, script: &str) -> PathBuf {
        let path = dir.join("fake-yt-dlp");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}
