//! Redis-backed store.
//!
//! Single-command operations use plain commands. The three compare-and-act
//! steps (lease, terminal move, lease reclaim) run as Lua scripts so each is
//! atomic on the server.
//!
//! The lease script builds record keys from the prefix, so every key of one
//! queue must live on the same server (no Redis Cluster sharding).

use std::collections::HashMap;

use async_trait::async_trait;
use firecast_models::{JobId, JobOutcome, JobState, QueueStats};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use tracing::{debug, info};

use super::{FinishOutcome, LeaseNext, QueueStore, ReclaimOutcome};
use crate::config::QueueConfig;
use crate::error::{QueueError, QueueResult};
use crate::keys::QueueKeys;
use crate::record::{JobRecord, FIELD_RETRIES};

// KEYS: pending, leases, done, failed   ARGV: expires_at, record key prefix, retries field
//
// Every check runs before the first write: a script that errors halfway is
// not rolled back. A record whose retry counter is unreadable is moved to
// the failed set so it cannot block the head of the list.
const LEASE_NEXT_SCRIPT: &str = r#"
local id = redis.call('LINDEX', KEYS[1], -1)
if not id then return {'empty'} end
if redis.call('SISMEMBER', KEYS[3], id) == 1 then
  redis.call('RPOP', KEYS[1])
  return {'done', id}
end
if redis.call('SISMEMBER', KEYS[4], id) == 1 then
  redis.call('RPOP', KEYS[1])
  return {'failed', id}
end
local record = ARGV[2] .. id
if redis.call('EXISTS', record) == 0 then
  redis.call('RPOP', KEYS[1])
  return {'missing', id}
end
if not tonumber(redis.call('HGET', record, ARGV[3]) or '') then
  redis.call('RPOP', KEYS[1])
  redis.call('SADD', KEYS[4], id)
  return {'corrupt', id}
end
redis.call('RPOP', KEYS[1])
redis.call('ZADD', KEYS[2], ARGV[1], id)
redis.call('HINCRBY', record, ARGV[3], 1)
local reply = {'granted', id}
for _, value in ipairs(redis.call('HGETALL', record)) do
  reply[#reply + 1] = value
end
return reply
"#;

// KEYS: done, failed, leases, pending, record, target   ARGV: id
const FINISH_SCRIPT: &str = r#"
if redis.call('SISMEMBER', KEYS[1], ARGV[1]) == 1 then return 1 end
if redis.call('SISMEMBER', KEYS[2], ARGV[1]) == 1 then return 2 end
if redis.call('EXISTS', KEYS[5]) == 0 then return 3 end
redis.call('ZREM', KEYS[3], ARGV[1])
redis.call('LREM', KEYS[4], 0, ARGV[1])
redis.call('SADD', KEYS[6], ARGV[1])
return 0
"#;

// KEYS: leases, record, pending, failed, done   ARGV: id, now, retry_budget
const RECLAIM_SCRIPT: &str = r#"
local expires = redis.call('ZSCORE', KEYS[1], ARGV[1])
if not expires or tonumber(expires) > tonumber(ARGV[2]) then return 0 end
redis.call('ZREM', KEYS[1], ARGV[1])
if redis.call('SISMEMBER', KEYS[5], ARGV[1]) == 1 or redis.call('SISMEMBER', KEYS[4], ARGV[1]) == 1 then
  return 0
end
local retries = tonumber(redis.call('HGET', KEYS[2], 'retries') or '0') or 0
if retries >= tonumber(ARGV[3]) then
  redis.call('SADD', KEYS[4], ARGV[1])
  return 2
end
redis.call('LPUSH', KEYS[3], ARGV[1])
redis.call('HSET', KEYS[2], 'last_attempt_at', ARGV[2])
return 1
"#;

/// Store backed by a Redis (or Valkey) server.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    keys: QueueKeys,
    lease_next: Script,
    finish: Script,
    reclaim: Script,
}

impl RedisStore {
    /// Connect to Redis.
    pub async fn connect(config: &QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())
            .map_err(|e| QueueError::connection_failed(format!("invalid Redis URL: {}", e)))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| QueueError::connection_failed(e.to_string()))?;

        info!("Connected to Redis (key prefix: {})", config.key_prefix);

        Ok(Self {
            conn,
            keys: QueueKeys::new(config.key_prefix.clone()),
            lease_next: Script::new(LEASE_NEXT_SCRIPT),
            finish: Script::new(FINISH_SCRIPT),
            reclaim: Script::new(RECLAIM_SCRIPT),
        })
    }
}

#[async_trait]
impl QueueStore for RedisStore {
    async fn insert_job(&self, record: &JobRecord) -> QueueResult<()> {
        let mut conn = self.conn.clone();

        // Record first, then the id, in one MULTI so a lease never pops an
        // id whose record is not there yet.
        redis::pipe()
            .atomic()
            .hset_multiple(self.keys.record(&record.id), &record.to_fields())
            .ignore()
            .lpush(&self.keys.pending, record.id.as_str())
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;

        debug!("Inserted job {}", record.id);
        Ok(())
    }

    async fn lease_next(&self, expires_at: i64) -> QueueResult<LeaseNext> {
        let mut conn = self.conn.clone();
        let reply: Vec<String> = self
            .lease_next
            .key(&self.keys.pending)
            .key(&self.keys.leases)
            .key(&self.keys.done)
            .key(&self.keys.failed)
            .arg(expires_at)
            .arg(self.keys.record_prefix())
            .arg(FIELD_RETRIES)
            .invoke_async(&mut conn)
            .await?;

        let mut reply = reply.into_iter();
        let status = reply.next().unwrap_or_default();
        if status == "empty" {
            return Ok(LeaseNext::Empty);
        }

        let id = reply
            .next()
            .map(JobId::from)
            .ok_or_else(|| QueueError::Store(format!("lease reply without id: {}", status)))?;

        match status.as_str() {
            "done" => Ok(LeaseNext::Terminal(id, JobState::Done)),
            "failed" => Ok(LeaseNext::Terminal(id, JobState::Failed)),
            "missing" => Ok(LeaseNext::Missing(id)),
            "corrupt" => Err(QueueError::corrupt(&id, "unreadable retries, moved to failed")),
            "granted" => {
                let mut fields = HashMap::new();
                while let (Some(field), Some(value)) = (reply.next(), reply.next()) {
                    fields.insert(field, value);
                }
                // The lease is already held, so a bad field here is recovered
                // by the sweeper once the lease expires.
                JobRecord::from_fields(&id, &fields)?
                    .map(LeaseNext::Granted)
                    .ok_or_else(|| QueueError::corrupt(&id, "leased record is empty"))
            }
            other => Err(QueueError::Store(format!(
                "unexpected lease reply {} for {}",
                other, id
            ))),
        }
    }

    async fn get_job(&self, id: &JobId) -> QueueResult<Option<JobRecord>> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn.hgetall(self.keys.record(id)).await?;
        JobRecord::from_fields(id, &fields)
    }

    async fn finish(&self, id: &JobId, outcome: JobOutcome) -> QueueResult<FinishOutcome> {
        let mut conn = self.conn.clone();
        let target = match outcome {
            JobOutcome::Done => &self.keys.done,
            JobOutcome::Failed => &self.keys.failed,
        };

        let result: i64 = self
            .finish
            .key(&self.keys.done)
            .key(&self.keys.failed)
            .key(&self.keys.leases)
            .key(&self.keys.pending)
            .key(self.keys.record(id))
            .key(target)
            .arg(id.as_str())
            .invoke_async(&mut conn)
            .await?;

        match result {
            0 => Ok(FinishOutcome::Moved),
            1 => Ok(FinishOutcome::AlreadyTerminal(JobState::Done)),
            2 => Ok(FinishOutcome::AlreadyTerminal(JobState::Failed)),
            3 => Ok(FinishOutcome::Unknown),
            other => Err(QueueError::Store(format!(
                "unexpected finish result {} for {}",
                other, id
            ))),
        }
    }

    async fn expired_leases(&self, now: i64) -> QueueResult<Vec<JobId>> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.zrangebyscore(&self.keys.leases, "-inf", now).await?;
        Ok(ids.into_iter().map(JobId::from).collect())
    }

    async fn reclaim(&self, id: &JobId, now: i64, retry_budget: u32) -> QueueResult<ReclaimOutcome> {
        let mut conn = self.conn.clone();
        let result: i64 = self
            .reclaim
            .key(&self.keys.leases)
            .key(self.keys.record(id))
            .key(&self.keys.pending)
            .key(&self.keys.failed)
            .key(&self.keys.done)
            .arg(id.as_str())
            .arg(now)
            .arg(retry_budget)
            .invoke_async(&mut conn)
            .await?;

        match result {
            0 => Ok(ReclaimOutcome::Skipped),
            1 => Ok(ReclaimOutcome::Requeued),
            2 => Ok(ReclaimOutcome::Failed),
            other => Err(QueueError::Store(format!(
                "unexpected reclaim result {} for {}",
                other, id
            ))),
        }
    }

    async fn counts(&self) -> QueueResult<QueueStats> {
        let mut conn = self.conn.clone();

        let pending_count: u64 = conn.llen(&self.keys.pending).await?;
        let leased_count: u64 = conn.zcard(&self.keys.leases).await?;
        let done_count: u64 = conn.scard(&self.keys.done).await?;
        let fail_count: u64 = conn.scard(&self.keys.failed).await?;

        Ok(QueueStats {
            pending_count,
            leased_count,
            done_count,
            fail_count,
        })
    }

    async fn ping(&self) -> QueueResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}
