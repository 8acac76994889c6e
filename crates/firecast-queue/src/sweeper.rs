//! Recovery sweeper for expired leases.
//!
//! Each pass collects the leases whose expiry has passed and, per job,
//! either puts it back on the pending index or moves it to the failed set
//! once its retry budget is spent.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::DEFAULT_SWEEP_INTERVAL_SECS;
use crate::queue::{names, JobQueue};
use crate::store::{QueueStore, ReclaimOutcome};

/// Outcome of one sweeper pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Expired leases found by the scan
    pub scanned: usize,
    pub requeued: usize,
    pub failed: usize,
    /// Leases already cleared by a terminal report or another sweeper
    pub skipped: usize,
    /// Per-job store errors
    pub errors: usize,
}

/// Periodically recovers expired leases.
pub struct LeaseSweeper {
    store: Arc<dyn QueueStore>,
    clock: Arc<dyn Clock>,
    retry_budget: u32,
    interval: Duration,
}

impl LeaseSweeper {
    pub fn new(
        store: Arc<dyn QueueStore>,
        clock: Arc<dyn Clock>,
        retry_budget: u32,
        interval: Duration,
    ) -> Self {
        let interval = if interval.is_zero() {
            warn!(
                "Sweep interval must be non-zero, using {}s",
                DEFAULT_SWEEP_INTERVAL_SECS
            );
            Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS)
        } else {
            interval
        };

        Self {
            store,
            clock,
            retry_budget,
            interval,
        }
    }

    /// Sweeper sharing the queue's store, clock and settings.
    pub fn from_queue(queue: &JobQueue) -> Self {
        let config = queue.config();
        Self::new(
            queue.store(),
            queue.clock(),
            config.retry_budget,
            config.sweep_interval,
        )
    }

    /// Run until `shutdown` turns true or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Starting lease sweeper (interval: {:?}, retry budget: {})",
            self.interval, self.retry_budget
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    self.sweep_once().await;
                }
            }
        }

        info!("Lease sweeper stopped");
    }

    /// One pass over the expired leases.
    pub async fn sweep_once(&self) -> SweepReport {
        let mut report = SweepReport::default();
        let now = self.clock.now();

        let expired = match self.store.expired_leases(now).await {
            Ok(ids) => ids,
            Err(e) => {
                error!("Failed to scan expired leases: {}", e);
                return report;
            }
        };
        report.scanned = expired.len();

        for id in expired {
            match self.store.reclaim(&id, now, self.retry_budget).await {
                Ok(ReclaimOutcome::Requeued) => {
                    report.requeued += 1;
                    counter!(names::JOBS_EXPIRED_TOTAL).increment(1);
                    counter!(names::JOBS_REQUEUED_TOTAL).increment(1);
                    info!(job_id = %id, "Lease expired, job requeued");
                }
                Ok(ReclaimOutcome::Failed) => {
                    report.failed += 1;
                    counter!(names::JOBS_EXPIRED_TOTAL).increment(1);
                    counter!(names::JOBS_FAILED_TOTAL).increment(1);
                    warn!(job_id = %id, "Lease expired with retry budget spent, job failed");
                }
                Ok(ReclaimOutcome::Skipped) => {
                    report.skipped += 1;
                    debug!(job_id = %id, "Lease already cleared");
                }
                Err(e) => {
                    report.errors += 1;
                    error!(job_id = %id, "Failed to reclaim lease: {}", e);
                }
            }
        }

        if report.scanned > 0 {
            info!(
                "Sweep done: {} expired, {} requeued, {} failed, {} skipped, {} errors",
                report.scanned, report.requeued, report.failed, report.skipped, report.errors
            );
        }
        report
    }
}
