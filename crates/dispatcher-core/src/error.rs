//! Crate-wide error taxonomy (C9, §4.9, §7).
//!
//! Loop bodies return `anyhow::Result<()>` at the boundary the supervisor
//! watches, but internally they match on [`DispatcherError`] to decide
//! whether a failure is contained at the iteration boundary (logged, loop
//! continues) or should propagate and bring the process down.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Database transport error (§7.2) — propagates out of the current
    /// iteration so the supervisor can exit and let the host restart it.
    #[error("task store error: {0}")]
    Store(#[source] anyhow::Error),

    /// Queue connectivity error (§7.1) — contained at the iteration boundary.
    #[error("queue store error: {0}")]
    Queue(#[source] anyhow::Error),

    /// Lease connectivity error (§7.1) — contained at the iteration boundary.
    #[error("lease store error: {0}")]
    Lease(#[source] anyhow::Error),

    /// A lease was released after its TTL expired and another owner had
    /// already claimed it (§4.3, §7.4). Always recoverable: log, don't
    /// propagate.
    #[error("lease {0} not owned by this caller (expired or reclaimed)")]
    LeaseNotOwned(String),

    /// `Task::bg_worker_task` did not resolve in the registry (§4.4, §7.5).
    /// Recoverable: log, release the lease, leave the row for re-promotion.
    #[error("no worker registered for queue_name {0:?}")]
    UnknownWorker(String),

    /// An opaque business failure returned by a worker's `run` (§6). Always
    /// treated as retryable by the runner.
    #[error("worker {worker} failed on task {task_id}: {source}")]
    Handler {
        worker: String,
        task_id: i64,
        #[source]
        source: anyhow::Error,
    },
}

/// A coarse classification used to decide whether an error should bubble out
/// of a loop body or be contained and logged (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeErrorCategory {
    /// Log and continue the current loop; no data was lost.
    Transient,
    /// Log and continue; the condition is expected to recur until an
    /// operator intervenes (e.g. an unknown worker type).
    Recoverable,
    /// Propagate so the supervisor exits and the process is restarted.
    Fatal,
}

/// Implemented by error types that know how to classify themselves for the
/// propagation policy in §7.
pub trait Categorizable {
    fn category(&self) -> SafeErrorCategory;
}

impl Categorizable for DispatcherError {
    fn category(&self) -> SafeErrorCategory {
        match self {
            DispatcherError::Store(_) => SafeErrorCategory::Fatal,
            DispatcherError::Queue(_) | DispatcherError::Lease(_) => SafeErrorCategory::Transient,
            DispatcherError::LeaseNotOwned(_) => SafeErrorCategory::Recoverable,
            DispatcherError::UnknownWorker(_) => SafeErrorCategory::Recoverable,
            DispatcherError::Handler { .. } => SafeErrorCategory::Recoverable,
        }
    }
}
