//! Queue API: submit, lease, complete, fail and status.

use std::sync::Arc;

use firecast_models::{JobId, JobOutcome, LeasedJob, QueueStats};
use metrics::counter;
use tracing::{debug, error, info, warn};
use url::{ParseError, Url};

use crate::clock::{Clock, SystemClock};
use crate::config::QueueConfig;
use crate::error::{QueueError, QueueResult};
use crate::record::JobRecord;
use crate::store::{FinishOutcome, LeaseNext, QueueStore, RedisStore};

/// Metric names emitted by the queue.
pub mod names {
    pub const JOBS_SUBMITTED_TOTAL: &str = "firecast_jobs_submitted_total";
    pub const JOBS_LEASED_TOTAL: &str = "firecast_jobs_leased_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "firecast_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "firecast_jobs_failed_total";
    pub const JOBS_REQUEUED_TOTAL: &str = "firecast_jobs_requeued_total";
    pub const JOBS_EXPIRED_TOTAL: &str = "firecast_jobs_expired_total";
    pub const TERMINAL_CONFLICTS_TOTAL: &str = "firecast_terminal_conflicts_total";
}

/// Job queue client.
///
/// Cheap to clone; clones share the same store and clock.
#[derive(Clone)]
pub struct JobQueue {
    store: Arc<dyn QueueStore>,
    clock: Arc<dyn Clock>,
    config: QueueConfig,
}

impl JobQueue {
    /// Create a queue over an existing store.
    pub fn new(store: Arc<dyn QueueStore>, config: QueueConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Connect to Redis with the given config.
    pub async fn connect(config: QueueConfig) -> QueueResult<Self> {
        let store = RedisStore::connect(&config).await?;
        Ok(Self::new(Arc::new(store), config))
    }

    /// Connect using environment variables.
    pub async fn from_env() -> QueueResult<Self> {
        Self::connect(QueueConfig::from_env()).await
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn QueueStore> {
        Arc::clone(&self.store)
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Submit a new job and return its id.
    pub async fn submit(&self, url: &str, playlist_id: i64) -> QueueResult<JobId> {
        let url = url.trim();
        if url.is_empty() || playlist_id == 0 {
            return Err(QueueError::validation("url and playlistId are required"));
        }
        validate_url(url)?;

        let record = JobRecord::new(JobId::new(), url, playlist_id, self.clock.now());
        self.store.insert_job(&record).await.map_err(|e| {
            error!(job_id = %record.id, "Failed to store job: {}", e);
            e
        })?;

        counter!(names::JOBS_SUBMITTED_TOTAL).increment(1);
        info!(job_id = %record.id, playlist_id, "Submitted job");
        Ok(record.id)
    }

    /// Lease the oldest pending job.
    ///
    /// `Ok(None)` means nothing is pending; callers should poll again later.
    pub async fn lease(&self) -> QueueResult<Option<LeasedJob>> {
        loop {
            let expires_at = self.clock.now().saturating_add(self.config.lease_duration_secs());
            let next = self.store.lease_next(expires_at).await.map_err(|e| {
                error!("Failed to lease job: {}", e);
                e
            })?;

            match next {
                LeaseNext::Granted(record) => {
                    counter!(names::JOBS_LEASED_TOTAL).increment(1);
                    info!(job_id = %record.id, attempt = record.retries, expires_at, "Leased job");
                    return Ok(Some(record.into_leased()));
                }
                LeaseNext::Empty => return Ok(None),
                LeaseNext::Terminal(id, state) => {
                    warn!(job_id = %id, state = %state, "Skipping pending job that is already terminal");
                }
                LeaseNext::Missing(id) => {
                    error!(job_id = %id, "Popped job has no record, dropping it");
                    return Err(QueueError::NotFound(id));
                }
            }
        }
    }

    /// Mark a job as done.
    pub async fn complete(&self, id: &str) -> QueueResult<()> {
        self.finish(id, JobOutcome::Done).await
    }

    /// Mark a job as failed.
    pub async fn fail(&self, id: &str) -> QueueResult<()> {
        self.finish(id, JobOutcome::Failed).await
    }

    async fn finish(&self, id: &str, outcome: JobOutcome) -> QueueResult<()> {
        let id = id.trim();
        if id.is_empty() {
            return Err(QueueError::validation("id is required"));
        }
        let id = JobId::from(id);

        let result = self.store.finish(&id, outcome).await.map_err(|e| {
            error!(job_id = %id, outcome = %outcome, "Failed to record outcome: {}", e);
            e
        })?;

        match result {
            FinishOutcome::Moved => {
                let metric = match outcome {
                    JobOutcome::Done => names::JOBS_COMPLETED_TOTAL,
                    JobOutcome::Failed => names::JOBS_FAILED_TOTAL,
                };
                counter!(metric).increment(1);
                info!(job_id = %id, outcome = %outcome, "Job finished");
                Ok(())
            }
            FinishOutcome::AlreadyTerminal(state) => {
                counter!(names::TERMINAL_CONFLICTS_TOTAL).increment(1);
                debug!(job_id = %id, state = %state, "Rejected repeated terminal report");
                Err(QueueError::Conflict { id, state })
            }
            FinishOutcome::Unknown => Err(QueueError::NotFound(id)),
        }
    }

    /// Current index sizes.
    pub async fn status(&self) -> QueueResult<QueueStats> {
        self.store.counts().await.map_err(|e| {
            error!("Failed to read queue counts: {}", e);
            e
        })
    }

    /// Check that the store is reachable.
    pub async fn ping(&self) -> QueueResult<()> {
        self.store.ping().await
    }
}

/// Absolute URLs must be http(s). Scheme-less references such as `u1` or
/// `youtu.be/x` are passed through for the worker to resolve.
fn validate_url(raw: &str) -> QueueResult<()> {
    if raw.chars().any(char::is_whitespace) {
        return Err(QueueError::validation("url must not contain whitespace"));
    }

    match Url::parse(raw) {
        Ok(parsed) => match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(QueueError::validation(format!(
                "unsupported url scheme: {}",
                other
            ))),
        },
        Err(ParseError::RelativeUrlWithoutBase) => Ok(()),
        Err(e) => Err(QueueError::validation(format!("invalid url: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    use firecast_models::JobState;

    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;

    const START: i64 = 1_752_416_738;

    fn queue() -> (JobQueue, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(START));
        let queue = JobQueue::new(store.clone(), QueueConfig::default()).with_clock(clock.clone());
        (queue, store, clock)
    }

    #[tokio::test]
    async fn test_submit_validates_input() {
        let (queue, _, _) = queue();

        for (url, playlist) in [("", 6), ("   ", 6), ("https://youtu.be/x", 0)] {
            let err = queue.submit(url, playlist).await.unwrap_err();
            assert!(matches!(err, QueueError::Validation(_)), "{url:?} {playlist}");
        }
        assert!(matches!(
            queue.submit("ftp://example.com/a", 6).await.unwrap_err(),
            QueueError::Validation(_)
        ));
        assert!(matches!(
            queue.submit("not a url", 6).await.unwrap_err(),
            QueueError::Validation(_)
        ));
        assert_eq!(queue.status().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_submit_accepts_scheme_less_reference() {
        let (queue, _, _) = queue();
        queue.submit("u1", 6).await.unwrap();
        queue.submit("youtu.be/x", 6).await.unwrap();
        assert_eq!(queue.status().await.unwrap().pending_count, 2);
    }

    #[tokio::test]
    async fn test_submit_initializes_record() {
        let (queue, store, _) = queue();
        let id = queue.submit("https://youtu.be/u1", 6).await.unwrap();

        let record = store.get_job(&id).await.unwrap().unwrap();
        assert_eq!(record.url, "https://youtu.be/u1");
        assert_eq!(record.playlist_id, 6);
        assert_eq!(record.retries, 0);
        assert_eq!(record.added_at, START);
        assert_eq!(record.last_attempt_at, START);
        assert_eq!(store.state_of(&id).await, Some(JobState::Pending));
    }

    #[tokio::test]
    async fn test_submissions_get_distinct_ids() {
        let (queue, _, _) = queue();
        let mut ids = HashSet::new();
        for i in 0..200 {
            ids.insert(queue.submit(&format!("https://e.com/{i}"), 1).await.unwrap());
        }
        assert_eq!(ids.len(), 200);
        assert_eq!(queue.status().await.unwrap().pending_count, 200);
    }

    #[tokio::test]
    async fn test_lease_on_empty_queue_is_not_an_error() {
        let (queue, _, _) = queue();
        assert!(queue.lease().await.unwrap().is_none());
        assert_eq!(queue.status().await.unwrap(), QueueStats::default());
    }

    #[tokio::test]
    async fn test_lease_is_fifo_and_reports_attempt() {
        let (queue, store, clock) = queue();
        let first = queue.submit("https://e.com/1", 6).await.unwrap();
        clock.advance(5);
        let second = queue.submit("https://e.com/2", 6).await.unwrap();

        let leased = queue.lease().await.unwrap().unwrap();
        assert_eq!(leased.id, first);
        assert_eq!(leased.retries, 1);
        assert_eq!(leased.added_at, START);
        // A plain lease grant leaves lastAttemptAt alone.
        assert_eq!(leased.last_attempt_at, START);
        assert_eq!(store.lease_expiry(&first).await, Some(START + 5 + 300));

        assert_eq!(queue.lease().await.unwrap().unwrap().id, second);
        assert!(queue.lease().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lease_with_missing_record_fails_loudly() {
        let (queue, store, _) = queue();
        let orphan = queue.submit("https://e.com/orphan", 1).await.unwrap();
        store.remove_record(&orphan).await;

        let err = queue.lease().await.unwrap_err();
        assert!(matches!(err, QueueError::NotFound(id) if id == orphan));
        assert_eq!(store.counts().await.unwrap().pending_count, 0);
        assert_eq!(store.counts().await.unwrap().leased_count, 0);
    }

    #[tokio::test]
    async fn test_lease_store_error_keeps_job_pending() {
        let (queue, store) = faulty_queue();
        let id = queue.submit("https://e.com/a", 6).await.unwrap();

        store.fail_lease.store(true, Ordering::SeqCst);
        let err = queue.lease().await.unwrap_err();
        assert!(err.is_store_error());
        assert_eq!(store.inner.state_of(&id).await, Some(JobState::Pending));
        assert_eq!(store.inner.counts().await.unwrap().total(), 1);

        store.fail_lease.store(false, Ordering::SeqCst);
        let leased = queue.lease().await.unwrap().unwrap();
        assert_eq!(leased.id, id);
        assert_eq!(leased.retries, 1);
    }

    #[tokio::test]
    async fn test_finish_store_error_changes_nothing() {
        let (queue, store) = faulty_queue();
        let id = queue.submit("https://e.com/a", 6).await.unwrap();
        queue.lease().await.unwrap().unwrap();
        let before = store.inner.counts().await.unwrap();

        store.fail_finish.store(true, Ordering::SeqCst);
        assert!(queue.complete(id.as_str()).await.unwrap_err().is_store_error());
        assert!(queue.fail(id.as_str()).await.unwrap_err().is_store_error());
        assert_eq!(store.inner.counts().await.unwrap(), before);
        assert_eq!(store.inner.state_of(&id).await, Some(JobState::Leased));

        store.fail_finish.store(false, Ordering::SeqCst);
        queue.complete(id.as_str()).await.unwrap();
        assert_eq!(queue.status().await.unwrap().done_count, 1);
    }

    #[tokio::test]
    async fn test_status_store_error_is_returned() {
        let (queue, store) = faulty_queue();
        queue.submit("https://e.com/a", 6).await.unwrap();

        store.fail_counts.store(true, Ordering::SeqCst);
        assert!(queue.status().await.unwrap_err().is_store_error());

        store.fail_counts.store(false, Ordering::SeqCst);
        assert_eq!(queue.status().await.unwrap().pending_count, 1);
    }

    #[tokio::test]
    async fn test_lease_skips_job_finished_while_pending() {
        let (queue, store, _) = queue();
        let a = queue.submit("https://e.com/a", 6).await.unwrap();
        let b = queue.submit("https://e.com/b", 6).await.unwrap();

        // Finishing a pending job removes it from the pending index.
        queue.complete(a.as_str()).await.unwrap();
        assert_eq!(store.pending_ids().await, vec![b.clone()]);

        assert_eq!(queue.lease().await.unwrap().unwrap().id, b);
    }

    #[tokio::test]
    async fn test_complete_and_fail_are_terminal() {
        let (queue, _, _) = queue();
        let a = queue.submit("https://e.com/a", 6).await.unwrap();
        queue.lease().await.unwrap();

        queue.complete(a.as_str()).await.unwrap();
        let before = queue.status().await.unwrap();

        let err = queue.complete(a.as_str()).await.unwrap_err();
        assert!(matches!(err, QueueError::Conflict { state: JobState::Done, .. }));
        let err = queue.fail(a.as_str()).await.unwrap_err();
        assert!(matches!(err, QueueError::Conflict { state: JobState::Done, .. }));

        assert_eq!(queue.status().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_finish_rejects_empty_and_unknown_ids() {
        let (queue, _, _) = queue();
        assert!(matches!(queue.complete("").await.unwrap_err(), QueueError::Validation(_)));
        assert!(matches!(queue.fail("  ").await.unwrap_err(), QueueError::Validation(_)));
        assert!(matches!(queue.complete("nope").await.unwrap_err(), QueueError::NotFound(_)));
        assert_eq!(queue.status().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_complete_and_fail_only_one_wins() {
        let (queue, _, _) = queue();
        for _ in 0..50 {
            let id = queue.submit("https://e.com/race", 1).await.unwrap();
            queue.lease().await.unwrap();

            let (done, failed) = tokio::join!(queue.complete(id.as_str()), queue.fail(id.as_str()));
            assert!(done.is_ok() ^ failed.is_ok());
        }

        let stats = queue.status().await.unwrap();
        assert_eq!(stats.done_count + stats.fail_count, 50);
        assert_eq!(stats.total(), 50);
    }

    #[tokio::test]
    async fn test_conservation_across_operations() {
        let (queue, _, _) = queue();
        let mut ids = Vec::new();
        for i in 0..10 {
            ids.push(queue.submit(&format!("https://e.com/{i}"), 1).await.unwrap());
            assert_eq!(queue.status().await.unwrap().total(), ids.len() as u64);
        }
        for _ in 0..6 {
            queue.lease().await.unwrap().unwrap();
            assert_eq!(queue.status().await.unwrap().total(), 10);
        }
        queue.complete(ids[0].as_str()).await.unwrap();
        queue.fail(ids[1].as_str()).await.unwrap();
        queue.complete(ids[9].as_str()).await.unwrap();

        let stats = queue.status().await.unwrap();
        assert_eq!(stats.total(), 10);
        assert_eq!(stats.pending_count, 3);
        assert_eq!(stats.leased_count, 4);
        assert_eq!(stats.done_count, 2);
        assert_eq!(stats.fail_count, 1);
    }

    fn faulty_queue() -> (JobQueue, Arc<FaultyStore>) {
        let store = Arc::new(FaultyStore::default());
        let queue = JobQueue::new(store.clone(), QueueConfig::default())
            .with_clock(Arc::new(ManualClock::new(START)));
        (queue, store)
    }

    /// Memory store whose operations can be made to fail before they run.
    #[derive(Default)]
    struct FaultyStore {
        inner: MemoryStore,
        fail_lease: AtomicBool,
        fail_finish: AtomicBool,
        fail_counts: AtomicBool,
    }

    fn check(flag: &AtomicBool) -> QueueResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(QueueError::connection_failed("connection reset"));
        }
        Ok(())
    }

    #[async_trait::async_trait]
    impl QueueStore for FaultyStore {
        async fn insert_job(&self, record: &JobRecord) -> QueueResult<()> {
            self.inner.insert_job(record).await
        }
        async fn lease_next(&self, expires_at: i64) -> QueueResult<LeaseNext> {
            check(&self.fail_lease)?;
            self.inner.lease_next(expires_at).await
        }
        async fn get_job(&self, id: &JobId) -> QueueResult<Option<JobRecord>> {
            self.inner.get_job(id).await
        }
        async fn finish(&self, id: &JobId, outcome: JobOutcome) -> QueueResult<FinishOutcome> {
            check(&self.fail_finish)?;
            self.inner.finish(id, outcome).await
        }
        async fn expired_leases(&self, now: i64) -> QueueResult<Vec<JobId>> {
            self.inner.expired_leases(now).await
        }
        async fn reclaim(
            &self,
            id: &JobId,
            now: i64,
            retry_budget: u32,
        ) -> QueueResult<crate::store::ReclaimOutcome> {
            self.inner.reclaim(id, now, retry_budget).await
        }
        async fn counts(&self) -> QueueResult<QueueStats> {
            check(&self.fail_counts)?;
            self.inner.counts().await
        }
        async fn ping(&self) -> QueueResult<()> {
            Ok(())
        }
    }
}
