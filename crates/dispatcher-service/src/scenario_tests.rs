//! End-to-end scenarios against the in-memory harness, exercising the public
//! `Queuer`/`Runner` loops rather than their internals — these are the S1-S6
//! scenarios and the invariants they stand in for.

use crate::{Queuer, Resources, Runner};
use dispatcher_core::registry::WorkerPolicy;
use dispatcher_core::task::NewTask;
use dispatcher_core::{async_trait, Worker, WorkerContext, WorkerRegistry};
use dispatcher_testing::{InMemoryLeaseStore, InMemoryQueueStore, InMemoryTaskStore, TestClock};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Deletes the row and counts invocations; never fails.
struct EchoWorker {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Worker<()> for EchoWorker {
    fn queue_name(&self) -> &str {
        "w"
    }

    fn retry_seconds(&self) -> i64 {
        10
    }

    async fn run(&self, ctx: WorkerContext<'_, ()>) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ctx.store().delete(ctx.task().id).await?;
        Ok(())
    }
}

/// Fails every call up to `fail_times`, then deletes the row.
struct FlakyWorker {
    calls: Arc<AtomicUsize>,
    fail_times: usize,
}

#[async_trait]
impl Worker<()> for FlakyWorker {
    fn queue_name(&self) -> &str {
        "w"
    }

    fn retry_seconds(&self) -> i64 {
        5
    }

    async fn run(&self, ctx: WorkerContext<'_, ()>) -> anyhow::Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_times {
            anyhow::bail!("simulated failure on attempt {call}");
        }
        ctx.store().delete(ctx.task().id).await?;
        Ok(())
    }
}

/// Completes only after `hold` elapses, so two concurrent runners can race
/// for the same lease.
struct SlowWorker {
    completions: Arc<AtomicUsize>,
    hold: Duration,
}

#[async_trait]
impl Worker<()> for SlowWorker {
    fn queue_name(&self) -> &str {
        "w"
    }

    fn retry_seconds(&self) -> i64 {
        10
    }

    async fn run(&self, ctx: WorkerContext<'_, ()>) -> anyhow::Result<()> {
        tokio::time::sleep(self.hold).await;
        self.completions.fetch_add(1, Ordering::SeqCst);
        ctx.store().delete(ctx.task().id).await?;
        Ok(())
    }
}

fn fixtures() -> (Resources, Arc<InMemoryTaskStore>, Arc<InMemoryQueueStore>, Arc<InMemoryLeaseStore>, TestClock) {
    let policies = vec![WorkerPolicy {
        queue_name: "w".to_string(),
        delay_seconds: 0,
        retry_seconds: 5,
    }];
    let clock = TestClock::default();
    let store = Arc::new(InMemoryTaskStore::with_clock(&policies, clock.clone()));
    let queue = Arc::new(InMemoryQueueStore::new());
    let leases = Arc::new(InMemoryLeaseStore::new());
    let resources = Resources::new(store.clone(), queue.clone(), leases.clone());
    (resources, store, queue, leases, clock)
}

/// S1: happy path. Queuer pushes an eligible task; a single runner pops it,
/// the handler succeeds and deletes the row; table and queue end up empty.
#[tokio::test(flavor = "multi_thread")]
async fn happy_path_drains_table_and_queue() {
    let (resources, store, queue, _leases, _clock) = fixtures();
    store.insert(NewTask::new("w", serde_json::json!({}))).await.unwrap();

    let queuer = Queuer::new(resources.clone(), Duration::from_millis(20));
    let queuer_cancel = CancellationToken::new();
    let queuer_handle = {
        let cancel = queuer_cancel.clone();
        tokio::spawn(async move { queuer.run(cancel).await })
    };

    let calls = Arc::new(AtomicUsize::new(0));
    let registry = WorkerRegistry::builder()
        .register(EchoWorker { calls: calls.clone() })
        .build();
    let runner = Runner::new(resources, Arc::new(registry), (), 1, Duration::from_millis(50), Duration::from_secs(5));
    let runner_cancel = CancellationToken::new();
    let runner_handle = {
        let cancel = runner_cancel.clone();
        tokio::spawn(async move { runner.run(cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(200)).await;
    queuer_cancel.cancel();
    runner_cancel.cancel();
    queuer_handle.await.unwrap().unwrap();
    runner_handle.await.unwrap().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.len().await, 0);
    assert_eq!(queue.len().await, 0);
}

/// S2: retry. The handler fails once, then succeeds; `num_pushed` reaches 2
/// before the row is finally deleted.
#[tokio::test(flavor = "multi_thread")]
async fn retrying_handler_eventually_deletes_the_row() {
    let (resources, store, _queue, _leases, clock) = fixtures();
    let id = store.insert(NewTask::new("w", serde_json::json!({}))).await.unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let registry = WorkerRegistry::builder()
        .register(FlakyWorker { calls: calls.clone(), fail_times: 1 })
        .build();
    let runner = Runner::new(resources.clone(), Arc::new(registry), (), 1, Duration::from_millis(50), Duration::from_secs(5));
    let runner_cancel = CancellationToken::new();
    let runner_task = {
        let cancel = runner_cancel.clone();
        tokio::spawn(async move { runner.run(cancel).await })
    };

    // First promotion: eligible immediately (delay=0), num_pushed -> 1.
    let promoted = resources.store.promote_eligible().await.unwrap();
    assert_eq!(promoted.len(), 1);
    resources.queue.push_if_absent(id, 0).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    // Handler failed; row survives with num_pushed == 1.
    assert_eq!(store.load(id).await.unwrap().unwrap().num_pushed, 1);

    // retry_seconds = 5: not eligible again until the clock advances.
    assert!(resources.store.promote_eligible().await.unwrap().is_empty());
    clock.advance(chrono::Duration::seconds(6));
    let promoted = resources.store.promote_eligible().await.unwrap();
    assert_eq!(promoted.len(), 1);
    assert_eq!(promoted[0].num_pushed, 2);
    resources.queue.push_if_absent(id, 0).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    runner_cancel.cancel();
    runner_task.await.unwrap().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.len().await, 0);
}

/// S3: exclusive lease. While one runner's handler is still in flight, the
/// task is (as if re-promoted) pushed onto the queue a second time; a second
/// runner pops that entry but fails to acquire the already-held lease and
/// loops without invoking its handler. Only one completion is ever observed.
#[tokio::test(flavor = "multi_thread")]
async fn a_second_runner_cannot_acquire_a_held_lease() {
    let (resources, store, queue, _leases, _clock) = fixtures();
    let id = store.insert(NewTask::new("w", serde_json::json!({}))).await.unwrap();
    resources.store.promote_eligible().await.unwrap();
    queue.push_if_absent(id, 0).await.unwrap();

    let completions = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::new();
    let mut cancels = Vec::new();
    for _ in 0..2 {
        let registry = WorkerRegistry::builder()
            .register(SlowWorker {
                completions: completions.clone(),
                hold: Duration::from_millis(150),
            })
            .build();
        let runner = Runner::new(resources.clone(), Arc::new(registry), (), 1, Duration::from_millis(50), Duration::from_secs(5));
        let cancel = CancellationToken::new();
        cancels.push(cancel.clone());
        handles.push(tokio::spawn(async move { runner.run(cancel).await }));
    }

    // Re-queue the same id shortly after the first runner has popped and
    // started working it, before it has deleted the row or released the
    // lease — simulating a queuer re-promotion racing the in-flight handler.
    tokio::time::sleep(Duration::from_millis(30)).await;
    let _ = queue.push_if_absent(id, 1).await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    for cancel in &cancels {
        cancel.cancel();
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(completions.load(Ordering::SeqCst), 1);
    assert_eq!(store.len().await, 0);
}

/// S4: queue dedup. Two concurrent promote-and-push rounds over one eligible
/// task yield exactly one queue entry and `num_pushed == 1`.
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_promotion_rounds_push_exactly_once() {
    let (resources, store, queue, _leases, _clock) = fixtures();
    let id = store.insert(NewTask::new("w", serde_json::json!({}))).await.unwrap();

    let round = |resources: Resources| async move {
        let promoted = resources.store.promote_eligible().await.unwrap();
        for task in promoted {
            resources.queue.push_if_absent(task.id, 0).await.unwrap();
        }
    };
    tokio::join!(round(resources.clone()), round(resources.clone()));

    assert_eq!(queue.len().await, 1);
    assert_eq!(store.load(id).await.unwrap().unwrap().num_pushed, 1);
}

/// S5: crash recovery. A runner that never releases its lease (simulating a
/// crash) blocks a second runner from claiming the task until the lease TTL
/// expires; the second runner then completes it.
#[tokio::test(flavor = "multi_thread")]
async fn a_timed_out_lease_is_reclaimed_after_ttl() {
    let (_resources, store, _queue, leases, _clock) = fixtures();
    let id = store.insert(NewTask::new("w", serde_json::json!({}))).await.unwrap();

    let lease_ttl = Duration::from_millis(150);
    let held = leases
        .acquire(&dispatcher_core::lease::LeaseHandle::key_for_task(id), lease_ttl)
        .await
        .unwrap()
        .unwrap();
    // Simulated crash: the holder never calls release().
    drop(held);

    // Immediately after, a second acquire attempt still fails.
    let too_soon = leases
        .acquire(&dispatcher_core::lease::LeaseHandle::key_for_task(id), lease_ttl)
        .await
        .unwrap();
    assert!(too_soon.is_none());

    tokio::time::sleep(lease_ttl + Duration::from_millis(50)).await;

    let reclaimed = leases
        .acquire(&dispatcher_core::lease::LeaseHandle::key_for_task(id), lease_ttl)
        .await
        .unwrap();
    assert!(reclaimed.is_some());
}

/// S6: unknown worker. The runner logs and releases the lease instead of
/// panicking; the row is left in place for re-promotion.
#[tokio::test(flavor = "multi_thread")]
async fn unknown_worker_type_leaves_the_row_in_place() {
    let (resources, store, queue, _leases, _clock) = fixtures();
    let id = store
        .insert(NewTask::new("does-not-exist", serde_json::json!({})))
        .await
        .unwrap();
    resources.store.promote_eligible().await.unwrap();
    queue.push_if_absent(id, 0).await.unwrap();

    let registry: WorkerRegistry<()> = WorkerRegistry::builder().build();
    let runner = Runner::new(resources, Arc::new(registry), (), 1, Duration::from_millis(50), Duration::from_secs(5));
    let cancel = CancellationToken::new();
    let handle = {
        let cancel = cancel.clone();
        tokio::spawn(async move { runner.run(cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(150)).await;
    cancel.cancel();
    handle.await.unwrap().unwrap();

    assert_eq!(store.len().await, 1);
    assert!(store.load(id).await.unwrap().is_some());
}
