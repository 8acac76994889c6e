//! Store capability used by the queue and the sweeper.
//!
//! The store is the single point of truth and synchronization. Each method
//! is atomic on its own; callers never hold an in-process lock across two
//! calls.

mod memory;
mod redis_store;

use async_trait::async_trait;
use firecast_models::{JobId, JobOutcome, JobState, QueueStats};

use crate::error::QueueResult;
use crate::record::JobRecord;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

/// Result of [`QueueStore::lease_next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseNext {
    /// The oldest pending id was popped and leased. The record carries the
    /// post-increment retry count.
    Granted(JobRecord),
    /// Nothing is pending.
    Empty,
    /// The popped id was already terminal; it was dropped from pending.
    Terminal(JobId, JobState),
    /// The popped id had no record; it was dropped from pending.
    Missing(JobId),
}

/// Result of [`QueueStore::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishOutcome {
    /// The job is now in the requested terminal set.
    Moved,
    /// The job was already terminal; nothing changed.
    AlreadyTerminal(JobState),
    /// No record exists for the id; nothing changed.
    Unknown,
}

/// Result of [`QueueStore::reclaim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclaimOutcome {
    /// Lease removed and the id appended to the pending index.
    Requeued,
    /// Lease removed and the id moved to the failed set.
    Failed,
    /// Lease was already gone, not yet expired, or the job was terminal.
    Skipped,
}

#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Write a new record and append its id to the tail of the pending index.
    async fn insert_job(&self, record: &JobRecord) -> QueueResult<()>;

    /// Pop the oldest pending id and lease it until `expires_at`.
    ///
    /// Popping, the terminal and record checks, the lease write and the
    /// retry increment happen as one step. On error nothing has changed, so
    /// the id is still pending.
    async fn lease_next(&self, expires_at: i64) -> QueueResult<LeaseNext>;

    /// Read a job record.
    async fn get_job(&self, id: &JobId) -> QueueResult<Option<JobRecord>>;

    /// Move a job into a terminal set unless it is already in either one.
    ///
    /// On success any lease entry and any pending entry for the id are removed.
    async fn finish(&self, id: &JobId, outcome: JobOutcome) -> QueueResult<FinishOutcome>;

    /// Ids whose lease expiry is at or before `now`.
    async fn expired_leases(&self, now: i64) -> QueueResult<Vec<JobId>>;

    /// Requeue or fail one expired lease.
    async fn reclaim(&self, id: &JobId, now: i64, retry_budget: u32) -> QueueResult<ReclaimOutcome>;

    /// Cardinalities of the four indexes, each read independently.
    async fn counts(&self) -> QueueResult<QueueStats>;

    /// Connectivity probe.
    async fn ping(&self) -> QueueResult<()>;
}
