//! In-process store with the same semantics as the Redis store.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use firecast_models::{JobId, JobOutcome, JobState, QueueStats};
use tokio::sync::Mutex;

use super::{FinishOutcome, LeaseNext, QueueStore, ReclaimOutcome};
use crate::error::QueueResult;
use crate::record::JobRecord;

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<JobId, JobRecord>,
    /// Front is the oldest entry.
    pending: VecDeque<JobId>,
    leases: HashMap<JobId, i64>,
    done: HashSet<JobId>,
    failed: HashSet<JobId>,
}

impl MemoryState {
    fn terminal_state(&self, id: &JobId) -> Option<JobState> {
        if self.done.contains(id) {
            Some(JobState::Done)
        } else if self.failed.contains(id) {
            Some(JobState::Failed)
        } else {
            None
        }
    }
}

/// Store kept entirely in memory. Every operation runs under one lock,
/// which gives it the same per-call atomicity as the Redis scripts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Which index currently references the job, if any.
    pub async fn state_of(&self, id: &JobId) -> Option<JobState> {
        let state = self.state.lock().await;
        if let Some(terminal) = state.terminal_state(id) {
            Some(terminal)
        } else if state.leases.contains_key(id) {
            Some(JobState::Leased)
        } else if state.pending.contains(id) {
            Some(JobState::Pending)
        } else {
            None
        }
    }

    /// Expiry of the lease held on a job.
    pub async fn lease_expiry(&self, id: &JobId) -> Option<i64> {
        self.state.lock().await.leases.get(id).copied()
    }

    /// Pending ids, oldest first.
    pub async fn pending_ids(&self) -> Vec<JobId> {
        self.state.lock().await.pending.iter().cloned().collect()
    }

    #[cfg(test)]
    pub(crate) async fn remove_record(&self, id: &JobId) {
        self.state.lock().await.records.remove(id);
    }
}

#[async_trait]
impl QueueStore for MemoryStore {
    async fn insert_job(&self, record: &JobRecord) -> QueueResult<()> {
        let mut state = self.state.lock().await;
        state.records.insert(record.id.clone(), record.clone());
        state.pending.push_back(record.id.clone());
        Ok(())
    }

    async fn lease_next(&self, expires_at: i64) -> QueueResult<LeaseNext> {
        let mut state = self.state.lock().await;
        let Some(id) = state.pending.pop_front() else {
            return Ok(LeaseNext::Empty);
        };

        if let Some(terminal) = state.terminal_state(&id) {
            return Ok(LeaseNext::Terminal(id, terminal));
        }

        let Some(record) = state.records.get_mut(&id) else {
            return Ok(LeaseNext::Missing(id));
        };
        record.retries += 1;
        let record = record.clone();

        state.leases.insert(id, expires_at);
        Ok(LeaseNext::Granted(record))
    }

    async fn get_job(&self, id: &JobId) -> QueueResult<Option<JobRecord>> {
        Ok(self.state.lock().await.records.get(id).cloned())
    }

    async fn finish(&self, id: &JobId, outcome: JobOutcome) -> QueueResult<FinishOutcome> {
        let mut state = self.state.lock().await;
        if let Some(terminal) = state.terminal_state(id) {
            return Ok(FinishOutcome::AlreadyTerminal(terminal));
        }
        if !state.records.contains_key(id) {
            return Ok(FinishOutcome::Unknown);
        }

        state.leases.remove(id);
        state.pending.retain(|pending| pending != id);
        match outcome {
            JobOutcome::Done => state.done.insert(id.clone()),
            JobOutcome::Failed => state.failed.insert(id.clone()),
        };
        Ok(FinishOutcome::Moved)
    }

    async fn expired_leases(&self, now: i64) -> QueueResult<Vec<JobId>> {
        let state = self.state.lock().await;
        let mut expired: Vec<(i64, JobId)> = state
            .leases
            .iter()
            .filter(|(_, expires_at)| **expires_at <= now)
            .map(|(id, expires_at)| (*expires_at, id.clone()))
            .collect();
        expired.sort();
        Ok(expired.into_iter().map(|(_, id)| id).collect())
    }

    async fn reclaim(&self, id: &JobId, now: i64, retry_budget: u32) -> QueueResult<ReclaimOutcome> {
        let mut state = self.state.lock().await;
        match state.leases.get(id) {
            Some(expires_at) if *expires_at <= now => {}
            _ => return Ok(ReclaimOutcome::Skipped),
        }

        state.leases.remove(id);
        if state.terminal_state(id).is_some() {
            return Ok(ReclaimOutcome::Skipped);
        }

        let retries = state.records.get(id).map(|r| r.retries).unwrap_or(0);
        if retries >= retry_budget {
            state.failed.insert(id.clone());
            return Ok(ReclaimOutcome::Failed);
        }

        state.pending.push_back(id.clone());
        if let Some(record) = state.records.get_mut(id) {
            record.last_attempt_at = now;
        }
        Ok(ReclaimOutcome::Requeued)
    }

    async fn counts(&self) -> QueueResult<QueueStats> {
        let state = self.state.lock().await;
        Ok(QueueStats {
            pending_count: state.pending.len() as u64,
            leased_count: state.leases.len() as u64,
            done_count: state.done.len() as u64,
            fail_count: state.failed.len() as u64,
        })
    }

    async fn ping(&self) -> QueueResult<()> {
        Ok(())
    }
}
