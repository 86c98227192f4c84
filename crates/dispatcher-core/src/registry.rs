//! Worker registry (C4, §4.4): the single, explicit registration point for
//! worker-type handlers. There is no runtime plugin discovery — every worker
//! is added by one call to [`WorkerRegistryBuilder::register`] at startup.

use crate::worker::Worker;
use std::collections::HashMap;
use std::sync::Arc;

/// The queuer's view of a worker: just enough to build the eligibility
/// expression (§4.1, §4.5). Decoupled from `Worker<R>` so the queuer binary
/// never needs to know the runner's resources type `R`.
#[derive(Debug, Clone)]
pub struct WorkerPolicy {
    pub queue_name: String,
    pub delay_seconds: i64,
    pub retry_seconds: i64,
}

/// Fallback policy applied to a `bg_worker_task` with no matching registry
/// entry (§4.1, §9): the source leaves this undocumented at `retry=200s`, so
/// that is the default we keep here.
pub const UNKNOWN_WORKER_RETRY_SECONDS: i64 = 200;
pub const UNKNOWN_WORKER_DELAY_SECONDS: i64 = 0;

/// Process-local mapping from `queue_name` to worker descriptor, built once by
/// the supervisor and shared (read-only) by every runner task.
pub struct WorkerRegistry<R> {
    workers: HashMap<String, Arc<dyn Worker<R>>>,
}

impl<R> WorkerRegistry<R> {
    pub fn builder() -> WorkerRegistryBuilder<R> {
        WorkerRegistryBuilder {
            workers: HashMap::new(),
        }
    }

    /// Resolve a worker by the name stored on `Task::bg_worker_task`.
    pub fn get(&self, queue_name: &str) -> Option<&Arc<dyn Worker<R>>> {
        self.workers.get(queue_name)
    }

    /// The queuer's view: policies for every registered worker, used once at
    /// startup to build the `CASE`-equivalent eligibility expression.
    pub fn policies(&self) -> Vec<WorkerPolicy> {
        self.workers
            .values()
            .map(|w| WorkerPolicy {
                queue_name: w.queue_name().to_string(),
                delay_seconds: w.delay_seconds(),
                retry_seconds: w.retry_seconds(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

/// Builds a [`WorkerRegistry`]. Registration panics on a duplicate
/// `queue_name` — that is a programmer error caught at startup, not a
/// runtime condition to recover from.
pub struct WorkerRegistryBuilder<R> {
    workers: HashMap<String, Arc<dyn Worker<R>>>,
}

impl<R> WorkerRegistryBuilder<R> {
    pub fn register(mut self, worker: impl Worker<R> + 'static) -> Self {
        let name = worker.queue_name().to_string();
        if self.workers.insert(name.clone(), Arc::new(worker)).is_some() {
            panic!("duplicate worker registered for queue_name {name:?}");
        }
        self
    }

    pub fn build(self) -> WorkerRegistry<R> {
        WorkerRegistry {
            workers: self.workers,
        }
    }
}

impl<R> Default for WorkerRegistryBuilder<R> {
    fn default() -> Self {
        Self {
            workers: HashMap::new(),
        }
    }
}
