//! Unit tests for the fakes themselves, so a bug in the harness doesn't
//! masquerade as a passing property test downstream.

use crate::{InMemoryLeaseStore, InMemoryQueueStore, InMemoryTaskStore};
use dispatcher_core::registry::WorkerPolicy;
use dispatcher_core::task::NewTask;
use dispatcher_core::{LeaseStore, QueueStore, TaskStore};
use std::time::Duration;

#[tokio::test]
async fn push_if_absent_is_idempotent_per_id() {
    let queue = InMemoryQueueStore::new();
    assert!(queue.push_if_absent(1, 100).await.unwrap());
    assert!(!queue.push_if_absent(1, 200).await.unwrap());

    let popped = queue
        .blocking_pop_min(Duration::from_millis(10))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(popped.task_id, 1);
    assert_eq!(popped.queued_at, 100);
}

#[tokio::test]
async fn blocking_pop_min_times_out_on_empty_queue() {
    let queue = InMemoryQueueStore::new();
    let popped = queue.blocking_pop_min(Duration::from_millis(20)).await.unwrap();
    assert!(popped.is_none());
}

#[tokio::test]
async fn second_acquire_fails_while_lease_is_held() {
    let leases = InMemoryLeaseStore::new();
    let first = leases.acquire("task-runner:1", Duration::from_secs(5)).await.unwrap();
    assert!(first.is_some());

    let second = leases.acquire("task-runner:1", Duration::from_secs(5)).await.unwrap();
    assert!(second.is_none());
}

#[tokio::test]
async fn release_with_wrong_owner_fails() {
    use dispatcher_core::lease::LeaseHandle;

    let leases = InMemoryLeaseStore::new();
    let real = leases.acquire("task-runner:1", Duration::from_secs(5)).await.unwrap().unwrap();
    let forged = LeaseHandle {
        name: real.name.clone(),
        owner_token: uuid::Uuid::new_v4(),
        ttl: real.ttl,
    };

    assert!(leases.release(&forged).await.is_err());
    assert!(leases.release(&real).await.is_ok());
}

#[tokio::test]
async fn promote_eligible_only_bumps_rows_past_their_anchor() {
    let policies = vec![WorkerPolicy {
        queue_name: "w".to_string(),
        delay_seconds: 10,
        retry_seconds: 5,
    }];
    let store = InMemoryTaskStore::new(&policies);
    let id = store
        .insert(NewTask::new("w", serde_json::json!({})))
        .await
        .unwrap();

    // Not eligible yet: delay hasn't elapsed (real clock, no sleep here).
    let promoted = store.promote_eligible().await.unwrap();
    assert!(promoted.is_empty());

    let loaded = store.load(id).await.unwrap().unwrap();
    assert_eq!(loaded.num_pushed, 0);
}
