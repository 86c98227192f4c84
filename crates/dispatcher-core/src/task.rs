//! The durable [`Task`] row and the values derived from it.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Primary key of a task row. Monotonic, unique, assigned by the store on insert.
pub type TaskId = i64;

/// A task as it exists in the durable store.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    /// Worker-type name; must match a [`crate::Worker::queue_name`] or the runner
    /// logs an error and leaves the row for a human to investigate.
    pub bg_worker_task: String,
    pub creation_time: DateTime<Utc>,
    /// Number of times the queuer has promoted this task. Monotonically non-decreasing.
    pub num_pushed: i32,
    pub params: Value,
    /// Overrides `creation_time` as the backoff anchor when present.
    pub execute_after: Option<DateTime<Utc>>,
}

/// The fields a producer supplies when creating a task; `num_pushed` always starts at 0
/// and `id`/`creation_time` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub bg_worker_task: String,
    pub params: Value,
    pub execute_after: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new(bg_worker_task: impl Into<String>, params: Value) -> Self {
        Self {
            bg_worker_task: bg_worker_task.into(),
            params,
            execute_after: None,
        }
    }

    pub fn with_execute_after(mut self, at: DateTime<Utc>) -> Self {
        self.execute_after = Some(at);
        self
    }
}

/// What `TaskStore::promote_eligible` returns for each row it bumped: just enough
/// to log the promotion and push the id into the queue, without re-reading the row.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotedTask {
    pub id: TaskId,
    pub bg_worker_task: String,
    pub num_pushed: i32,
}

/// Pure function of a worker's timing policy and a task's state: the linear backoff
/// schedule from §4.1/§4.5 — `anchor + delay + num_pushed * retry`.
pub fn next_eligible_time(
    anchor: DateTime<Utc>,
    num_pushed: i32,
    delay_seconds: i64,
    retry_seconds: i64,
) -> DateTime<Utc> {
    anchor + chrono::Duration::seconds(delay_seconds) + chrono::Duration::seconds(retry_seconds * num_pushed as i64)
}
