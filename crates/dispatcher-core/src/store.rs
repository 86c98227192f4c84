//! Contract for the durable task store (C1, §4.1).

use crate::task::{NewTask, PromotedTask, Task, TaskId};
use async_trait::async_trait;

/// Durable home for task rows. Implementations must provide the row-level
/// locking / skip-locked semantics described in §4.1 and §9 — there is no
/// substitute for expressing that directly in the backing store's query
/// language.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new row with `num_pushed = 0`. Returns the assigned id.
    async fn insert(&self, task: NewTask) -> anyhow::Result<TaskId>;

    /// Atomically select every row whose next-eligible time has passed
    /// (`SELECT ... FOR UPDATE SKIP LOCKED`), increment `num_pushed` for each,
    /// and return the bumped rows — all in one statement / one transaction.
    /// This is the combined realization of the two-step
    /// `select_eligible_for_update` + `bump` contract from §4.1: splitting it
    /// into two round trips would reopen the race skip-locked exists to close.
    async fn promote_eligible(&self) -> anyhow::Result<Vec<PromotedTask>>;

    /// Load a task row by id, or `None` if it has already been deleted.
    async fn load(&self, id: TaskId) -> anyhow::Result<Option<Task>>;

    /// Delete a task row. Called by a worker on successful completion.
    async fn delete(&self, id: TaskId) -> anyhow::Result<()>;
}
