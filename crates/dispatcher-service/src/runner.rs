//! Runner loop (C6, §4.6): pops task ids off the queue, acquires the
//! corresponding lease, and dispatches to the registered worker.
//!
//! A single [`Runner`] owns `concurrency` independent worker loops, all
//! sharing the same [`Resources`] and [`WorkerRegistry`]. There is no
//! in-process fan-out beyond that: one popped entry is handled start to
//! finish by the task that popped it, matching the "one runner process, N
//! greenlets" shape of the source (§5).

use crate::resources::Resources;
use dispatcher_core::lease::LeaseHandle;
use dispatcher_core::queue::QueueEntry;
use dispatcher_core::{DispatcherError, WorkerContext, WorkerRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

/// Deployment-specific resources handed to every [`dispatcher_core::Worker::run`]
/// call, kept distinct from [`Resources`] so the queuer (which has no use for
/// `R`) never has to name it.
pub struct Runner<R> {
    resources: Resources,
    registry: Arc<WorkerRegistry<R>>,
    extra: Arc<R>,
    concurrency: usize,
    pop_timeout: Duration,
    lease_ttl: Duration,
}

impl<R: Send + Sync + 'static> Runner<R> {
    pub fn new(
        resources: Resources,
        registry: Arc<WorkerRegistry<R>>,
        extra: R,
        concurrency: usize,
        pop_timeout: Duration,
        lease_ttl: Duration,
    ) -> Self {
        Self {
            resources,
            registry,
            extra: Arc::new(extra),
            concurrency,
            pop_timeout,
            lease_ttl,
        }
    }

    /// Run `concurrency` worker loops until `cancel` fires or one of them
    /// returns a fatal error. Mirrors the queuer's restart-the-process
    /// posture for store transience (§7.2): a single loop's fatal error
    /// cancels its siblings and propagates out.
    pub async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        let mut joins = JoinSet::new();
        for index in 0..self.concurrency {
            let resources = self.resources.clone();
            let registry = self.registry.clone();
            let extra = self.extra.clone();
            let pop_timeout = self.pop_timeout;
            let lease_ttl = self.lease_ttl;
            let cancel = cancel.clone();
            joins.spawn(async move {
                worker_loop(index, resources, registry, extra, pop_timeout, lease_ttl, cancel).await
            });
        }

        let mut first_error = None;
        while let Some(result) = joins.join_next().await {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    cancel.cancel();
                    first_error.get_or_insert(err);
                }
                Err(join_err) => {
                    cancel.cancel();
                    first_error.get_or_insert(anyhow::anyhow!("runner task panicked: {join_err}"));
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

async fn worker_loop<R: Send + Sync + 'static>(
    index: usize,
    resources: Resources,
    registry: Arc<WorkerRegistry<R>>,
    extra: Arc<R>,
    pop_timeout: Duration,
    lease_ttl: Duration,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    loop {
        let popped = tokio::select! {
            _ = cancel.cancelled() => {
                info!(index, "runner loop cancelled");
                return Ok(());
            }
            popped = resources.queue.blocking_pop_min(pop_timeout) => popped,
        };

        let entry = match popped {
            Ok(Some(entry)) => entry,
            Ok(None) => continue,
            Err(err) => {
                // Queue connectivity (§7.1): contained here, next pop retries.
                warn!(index, error = %err, "blocking_pop_min failed, retrying");
                continue;
            }
        };

        handle_entry(&resources, &registry, &extra, lease_ttl, entry)
            .instrument(info_span!("runner_task", index, task_id = entry.task_id))
            .await;
    }
}

/// Steps 3-7 of §4.6 for one popped entry. Every branch that can recur under
/// normal operation (no lease, unknown row, unknown worker, handler failure,
/// expired lease on release) is contained here and logged rather than
/// propagated — only the two fatal paths in [`worker_loop`] and the store
/// error wrapped by [`dispatcher_core::TaskStore::load`] escape the runner.
async fn handle_entry<R: Send + Sync + 'static>(
    resources: &Resources,
    registry: &WorkerRegistry<R>,
    extra: &R,
    lease_ttl: Duration,
    entry: QueueEntry,
) {
    let lease_name = LeaseHandle::key_for_task(entry.task_id);
    let lease = match resources.leases.acquire(&lease_name, lease_ttl).await {
        Ok(Some(lease)) => lease,
        Ok(None) => {
            info!(task_id = entry.task_id, "lease already held, skipping");
            return;
        }
        Err(err) => {
            warn!(task_id = entry.task_id, error = %err, "lease acquire failed");
            return;
        }
    };

    let task = match resources.store.load(entry.task_id).await {
        Ok(Some(task)) => task,
        Ok(None) => {
            info!(task_id = entry.task_id, "task already deleted, nothing to do");
            release(resources, &lease).await;
            return;
        }
        Err(err) => {
            error!(task_id = entry.task_id, error = %err, "task store load failed");
            release(resources, &lease).await;
            return;
        }
    };

    let worker = match registry.get(&task.bg_worker_task) {
        Some(worker) => worker.clone(),
        None => {
            let err = DispatcherError::UnknownWorker(task.bg_worker_task.clone());
            error!(task_id = task.id, worker = %task.bg_worker_task, "{err}");
            release(resources, &lease).await;
            return;
        }
    };

    let ctx = WorkerContext::new(&task, &lease, resources.store.as_ref(), extra);
    match worker.run(ctx).await {
        Ok(()) => {
            info!(task_id = task.id, worker = %task.bg_worker_task, "task completed");
        }
        Err(source) => {
            let err = DispatcherError::Handler {
                worker: task.bg_worker_task.clone(),
                task_id: task.id,
                source,
            };
            warn!(task_id = task.id, "{err}");
        }
    }

    release(resources, &lease).await;
}

async fn release(resources: &Resources, lease: &LeaseHandle) {
    if let Err(err) = resources.leases.release(lease).await {
        if err.downcast_ref::<DispatcherError>().is_some_and(|e| matches!(e, DispatcherError::LeaseNotOwned(_))) {
            warn!(lease = %lease.name, "{err}");
        } else {
            warn!(lease = %lease.name, error = %err, "lease release failed");
        }
    }
}
