//! Job record stored as a field map.

use std::collections::HashMap;

use firecast_models::{JobId, LeasedJob};

use crate::error::{QueueError, QueueResult};

pub const FIELD_URL: &str = "url";
pub const FIELD_PLAYLIST_ID: &str = "playlist_id";
pub const FIELD_RETRIES: &str = "retries";
pub const FIELD_ADDED_AT: &str = "added_at";
pub const FIELD_LAST_ATTEMPT_AT: &str = "last_attempt_at";

/// Per-job attributes. Records are never deleted; only index membership
/// changes over a job's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub id: JobId,
    pub url: String,
    pub playlist_id: i64,
    /// Number of lease grants so far
    pub retries: u32,
    pub added_at: i64,
    pub last_attempt_at: i64,
}

impl JobRecord {
    /// A freshly submitted job.
    pub fn new(id: JobId, url: impl Into<String>, playlist_id: i64, now: i64) -> Self {
        Self {
            id,
            url: url.into(),
            playlist_id,
            retries: 0,
            added_at: now,
            last_attempt_at: now,
        }
    }

    /// Field map written to the store.
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            (FIELD_URL, self.url.clone()),
            (FIELD_PLAYLIST_ID, self.playlist_id.to_string()),
            (FIELD_RETRIES, self.retries.to_string()),
            (FIELD_ADDED_AT, self.added_at.to_string()),
            (FIELD_LAST_ATTEMPT_AT, self.last_attempt_at.to_string()),
        ]
    }

    /// Rebuild a record from its field map. An empty map means no record.
    pub fn from_fields(id: &JobId, fields: &HashMap<String, String>) -> QueueResult<Option<Self>> {
        if fields.is_empty() {
            return Ok(None);
        }

        let url = fields
            .get(FIELD_URL)
            .cloned()
            .ok_or_else(|| QueueError::corrupt(id, "missing url"))?;

        Ok(Some(Self {
            id: id.clone(),
            url,
            playlist_id: parse_field(id, fields, FIELD_PLAYLIST_ID)?,
            retries: parse_field(id, fields, FIELD_RETRIES)?,
            added_at: parse_field(id, fields, FIELD_ADDED_AT)?,
            last_attempt_at: parse_field(id, fields, FIELD_LAST_ATTEMPT_AT)?,
        }))
    }

    /// Payload returned to the worker holding the lease.
    pub fn into_leased(self) -> LeasedJob {
        LeasedJob {
            id: self.id,
            url: self.url,
            playlist_id: self.playlist_id,
            retries: self.retries,
            added_at: self.added_at,
            last_attempt_at: self.last_attempt_at,
        }
    }
}

fn parse_field<T: std::str::FromStr>(
    id: &JobId,
    fields: &HashMap<String, String>,
    name: &str,
) -> QueueResult<T> {
    let raw = fields
        .get(name)
        .ok_or_else(|| QueueError::corrupt(id, format!("missing {}", name)))?;
    raw.parse()
        .map_err(|_| QueueError::corrupt(id, format!("invalid {}: {}", name, raw)))
}
