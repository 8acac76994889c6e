//! Job executor: lease, process, report.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use firecast_models::LeasedJob;

use crate::client::QueueClient;
use crate::config::DEFAULT_POLL_INTERVAL_SECS;
use crate::error::WorkerResult;
use crate::processor::JobProcessor;

/// Polls the queue and works through jobs one at a time.
pub struct JobExecutor {
    client: QueueClient,
    processor: JobProcessor,
    poll_interval: Duration,
}

impl JobExecutor {
    pub fn new(client: QueueClient, processor: JobProcessor, poll_interval: Duration) -> Self {
        let poll_interval = if poll_interval.is_zero() {
            warn!(
                "Poll interval must be non-zero, using {}s",
                DEFAULT_POLL_INTERVAL_SECS
            );
            Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS)
        } else {
            poll_interval
        };

        Self {
            client,
            processor,
            poll_interval,
        }
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// Each tick drains the queue before waiting again. A job that is already
    /// being processed is finished and reported before the loop exits.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Starting job executor, polling every {:?}", self.poll_interval);

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    loop {
                        match self.poll_once().await {
                            Ok(true) if !*shutdown.borrow() => continue,
                            Ok(_) => break,
                            Err(e) => {
                                warn!("Failed to lease job: {}", e);
                                break;
                            }
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Job executor stopped");
    }

    /// Lease and process at most one job. Returns `false` when the queue was empty.
    pub async fn poll_once(&self) -> WorkerResult<bool> {
        let Some(job) = self.client.lease().await? else {
            return Ok(false);
        };

        info!(job_id = %job.id, attempt = job.retries, "Processing job");

        match self.processor.process(&job).await {
            Ok(_) => self.report_done(&job).await,
            Err(e) => {
                error!(
                    job_id = %job.id,
                    permanent = e.is_permanent_failure(),
                    "Job failed: {}",
                    e
                );
                self.report_failed(&job).await;
            }
        }

        Ok(true)
    }

    // A failed report is only logged: the lease expires and the sweeper
    // takes the job back.
    async fn report_done(&self, job: &LeasedJob) {
        match self.client.complete(job.id.as_str()).await {
            Ok(()) => info!(job_id = %job.id, "Job marked as done"),
            Err(e) => warn!(job_id = %job.id, "Failed to report job as done: {}", e),
        }
    }

    async fn report_failed(&self, job: &LeasedJob) {
        if let Err(e) = self.client.fail(job.id.as_str()).await {
            warn!(job_id = %job.id, "Failed to report job as failed: {}", e);
        }
    }
}
