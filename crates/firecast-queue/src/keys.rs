//! Redis key layout.

use firecast_models::JobId;

/// Names of the keys backing one queue.
///
/// With the default `videos` prefix the layout is:
/// - `videos:queue` list of pending ids (LPUSH in, RPOP out)
/// - `videos:wip` sorted set of leased ids scored by lease expiry
/// - `videos:done` / `videos:fail` terminal sets
/// - `videos:meta:<id>` hash holding the job record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueKeys {
    prefix: String,
    pub pending: String,
    pub leases: String,
    pub done: String,
    pub failed: String,
}

impl QueueKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            pending: format!("{}:queue", prefix),
            leases: format!("{}:wip", prefix),
            done: format!("{}:done", prefix),
            failed: format!("{}:fail", prefix),
            prefix,
        }
    }

    /// Key of the record hash for a job.
    pub fn record(&self, id: &JobId) -> String {
        format!("{}{}", self.record_prefix(), id)
    }

    /// Record key without the id, for scripts that resolve ids server-side.
    pub fn record_prefix(&self) -> String {
        format!("{}:meta:", self.prefix)
    }
}

impl Default for QueueKeys {
    fn default() -> Self {
        Self::new("videos")
    }
}
