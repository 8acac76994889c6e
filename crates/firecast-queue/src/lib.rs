//! Lease-based job queue with timeout recovery.
//!
//! This crate provides:
//! - Job submission into a FIFO pending index
//! - Time-bounded exclusive leases for workers
//! - Atomic terminal transitions into the done/failed sets
//! - A background sweeper that requeues or fails abandoned leases
//! - Redis and in-memory store backends behind one capability trait

pub mod clock;
pub mod config;
pub mod error;
pub mod keys;
pub mod queue;
pub mod record;
pub mod store;
pub mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::QueueConfig;
pub use error::{QueueError, QueueResult};
pub use keys::QueueKeys;
pub use queue::JobQueue;
pub use record::JobRecord;
pub use store::{FinishOutcome, LeaseNext, MemoryStore, QueueStore, ReclaimOutcome, RedisStore};
pub use sweeper::{LeaseSweeper, SweepReport};
