//! Redis store integration tests.
//!
//! Each test writes under its own key prefix so runs do not interfere.

use std::sync::Arc;
use std::time::Duration;

use firecast_models::{JobId, JobState};
use firecast_queue::{
    Clock, JobQueue, LeaseSweeper, ManualClock, QueueConfig, QueueError, QueueStore, RedisStore,
};

async fn redis_queue(lease_secs: u64, retry_budget: u32) -> (JobQueue, Arc<ManualClock>) {
    dotenvy::dotenv().ok();

    let config = QueueConfig::from_env()
        .with_key_prefix(format!("firecast-test:{}", JobId::new()))
        .with_lease_duration(Duration::from_secs(lease_secs))
        .with_retry_budget(retry_budget);
    let store = RedisStore::connect(&config)
        .await
        .expect("Failed to connect to Redis");
    let clock = Arc::new(ManualClock::new(1_752_416_738));
    let queue = JobQueue::new(Arc::new(store), config).with_clock(clock.clone());
    (queue, clock)
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_redis_ping() {
    let (queue, _) = redis_queue(300, 3).await;
    queue.ping().await.expect("Failed to ping Redis");
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_submit_lease_complete() {
    let (queue, _) = redis_queue(300, 3).await;

    let first = queue.submit("https://youtu.be/one", 6).await.unwrap();
    let second = queue.submit("https://youtu.be/two", 7).await.unwrap();

    let leased = queue.lease().await.unwrap().expect("no job leased");
    assert_eq!(leased.id, first);
    assert_eq!(leased.url, "https://youtu.be/one");
    assert_eq!(leased.playlist_id, 6);
    assert_eq!(leased.retries, 1);

    queue.complete(first.as_str()).await.unwrap();
    let err = queue.fail(first.as_str()).await.unwrap_err();
    assert!(matches!(err, QueueError::Conflict { state: JobState::Done, .. }));

    let stats = queue.status().await.unwrap();
    assert_eq!(stats.pending_count, 1);
    assert_eq!(stats.leased_count, 0);
    assert_eq!(stats.done_count, 1);

    assert_eq!(queue.lease().await.unwrap().unwrap().id, second);
    assert!(queue.lease().await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_expired_lease_recovery() {
    let (queue, clock) = redis_queue(30, 2).await;
    let sweeper = LeaseSweeper::from_queue(&queue);
    let id = queue.submit("https://youtu.be/slow", 6).await.unwrap();

    queue.lease().await.unwrap().unwrap();
    clock.advance(30);
    assert_eq!(sweeper.sweep_once().await.requeued, 1);

    let record = queue.store().get_job(&id).await.unwrap().unwrap();
    assert_eq!(record.last_attempt_at, clock.now());

    let leased = queue.lease().await.unwrap().unwrap();
    assert_eq!(leased.retries, 2);
    clock.advance(30);
    assert_eq!(sweeper.sweep_once().await.failed, 1);

    let stats = queue.status().await.unwrap();
    assert_eq!(stats.fail_count, 1);
    assert_eq!(stats.total(), 1);
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_concurrent_terminal_reports() {
    let (queue, _) = redis_queue(300, 3).await;
    let id = queue.submit("https://youtu.be/race", 6).await.unwrap();
    queue.lease().await.unwrap().unwrap();

    let (done, failed) = tokio::join!(queue.complete(id.as_str()), queue.fail(id.as_str()));
    assert!(done.is_ok() ^ failed.is_ok());

    let stats = queue.status().await.unwrap();
    assert_eq!(stats.done_count + stats.fail_count, 1);
}
