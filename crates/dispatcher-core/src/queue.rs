//! Contract for the shared queue (C2, §4.2): a sorted set keyed by task id.

use crate::task::TaskId;
use async_trait::async_trait;
use std::time::Duration;

/// The well-known key for the global task queue's sorted set.
pub const GLOBAL_TASK_QUEUE: &str = "global-task-queue";

/// One entry popped off the queue: the task id and the timestamp (epoch
/// seconds) at which it was pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    pub task_id: TaskId,
    pub queued_at: i64,
}

/// Externally hosted sorted set of pending task ids, scored by push timestamp.
/// Implementations must make both operations atomic and multi-consumer safe
/// (§4.2): no two callers may ever receive the same popped entry, and a
/// duplicate `push_if_absent` for an id already present must be a no-op.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Insert `task_id` with `score` iff no entry for that id already exists.
    /// Returns whether a new entry was created.
    async fn push_if_absent(&self, task_id: TaskId, score: i64) -> anyhow::Result<bool>;

    /// Block up to `timeout` waiting for the entry with the smallest score.
    /// Returns `None` on timeout so the caller can loop and check for
    /// shutdown between waits.
    async fn blocking_pop_min(&self, timeout: Duration) -> anyhow::Result<Option<QueueEntry>>;
}
