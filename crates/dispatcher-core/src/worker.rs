//! The handler interface dispatched to by the runner loop (C6), consuming C4.

use crate::lease::LeaseHandle;
use crate::store::TaskStore;
use crate::task::Task;
use async_trait::async_trait;

/// Everything a handler needs to execute one task: the row, the lease that
/// currently grants exclusive ownership of it, the store (so the handler can
/// delete the row on success), and the process-wide resources bundle `R`
/// (database pools, HTTP clients, whatever the deployment's workers need).
///
/// `ctx.lease().extend()` should be called periodically by handlers whose work
/// may outlast the default TTL (see §4.3, §4.6).
pub struct WorkerContext<'a, R> {
    task: &'a Task,
    lease: &'a LeaseHandle,
    store: &'a dyn TaskStore,
    resources: &'a R,
}

impl<'a, R> WorkerContext<'a, R> {
    pub fn new(
        task: &'a Task,
        lease: &'a LeaseHandle,
        store: &'a dyn TaskStore,
        resources: &'a R,
    ) -> Self {
        Self {
            task,
            lease,
            store,
            resources,
        }
    }

    pub fn task(&self) -> &Task {
        self.task
    }

    pub fn lease(&self) -> &LeaseHandle {
        self.lease
    }

    pub fn store(&self) -> &dyn TaskStore {
        self.store
    }

    pub fn resources(&self) -> &R {
        self.resources
    }
}

/// A worker-type handler: stable name, timing policy, and the actual work.
///
/// Contract (§6): `run` must *either* delete the task row via `ctx.store()`
/// (success — the runner commits) *or* return `Err` (retry — the row is left
/// in place and will be re-promoted after backoff). There is no "fatal, do not
/// retry" variant in the core; policy layers above may inspect `num_pushed`
/// and choose not to re-promote a task that has failed too many times.
#[async_trait]
pub trait Worker<R>: Send + Sync {
    /// Stable identifier, unique within the registry. Matches `Task::bg_worker_task`.
    fn queue_name(&self) -> &str;

    /// Seconds to wait after task creation before the first promotion.
    fn delay_seconds(&self) -> i64 {
        0
    }

    /// Seconds added to the backoff per retry (linear in `num_pushed`).
    fn retry_seconds(&self) -> i64;

    /// Execute the task. Implementations must delete the row from the store on
    /// success; any `Err` is treated as a retryable failure by the runner.
    async fn run(&self, ctx: WorkerContext<'_, R>) -> anyhow::Result<()>;
}
