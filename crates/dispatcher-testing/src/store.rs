//! In-memory fake of [`TaskStore`] (C1). A `tokio::sync::Mutex` stands in for
//! the row-level locks / `FOR UPDATE SKIP LOCKED` semantics a real Postgres
//! store provides: the whole `promote_eligible` body runs under the lock, so
//! two concurrent callers still observe the same all-or-nothing atomicity
//! the contract requires (§4.1).

use crate::clock::TestClock;
use async_trait::async_trait;
use dispatcher_core::registry::{WorkerPolicy, UNKNOWN_WORKER_DELAY_SECONDS, UNKNOWN_WORKER_RETRY_SECONDS};
use dispatcher_core::task::{next_eligible_time, NewTask, PromotedTask, Task, TaskId};
use dispatcher_core::TaskStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy)]
struct Policy {
    delay_seconds: i64,
    retry_seconds: i64,
}

pub struct InMemoryTaskStore {
    tasks: Mutex<HashMap<TaskId, Task>>,
    next_id: AtomicI64,
    policies: HashMap<String, Policy>,
    clock: TestClock,
}

impl InMemoryTaskStore {
    pub fn new(policies: &[WorkerPolicy]) -> Self {
        Self::with_clock(policies, TestClock::default())
    }

    pub fn with_clock(policies: &[WorkerPolicy], clock: TestClock) -> Self {
        let policies = policies
            .iter()
            .map(|p| {
                (
                    p.queue_name.clone(),
                    Policy {
                        delay_seconds: p.delay_seconds,
                        retry_seconds: p.retry_seconds,
                    },
                )
            })
            .collect();

        Self {
            tasks: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            policies,
            clock,
        }
    }

    pub fn clock(&self) -> &TestClock {
        &self.clock
    }

    fn policy_for(&self, worker: &str) -> Policy {
        self.policies.get(worker).copied().unwrap_or(Policy {
            delay_seconds: UNKNOWN_WORKER_DELAY_SECONDS,
            retry_seconds: UNKNOWN_WORKER_RETRY_SECONDS,
        })
    }

    /// Test-only inspection hook: how many rows currently exist.
    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, new_task: NewTask) -> anyhow::Result<TaskId> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let task = Task {
            id,
            bg_worker_task: new_task.bg_worker_task,
            creation_time: self.clock.now(),
            num_pushed: 0,
            params: new_task.params,
            execute_after: new_task.execute_after,
        };
        self.tasks.lock().await.insert(id, task);
        Ok(id)
    }

    async fn promote_eligible(&self) -> anyhow::Result<Vec<PromotedTask>> {
        let now = self.clock.now();
        let mut tasks = self.tasks.lock().await;
        let mut promoted = Vec::new();

        for task in tasks.values_mut() {
            let policy = self.policy_for(&task.bg_worker_task);
            let anchor = task.execute_after.unwrap_or(task.creation_time);
            let eligible_at =
                next_eligible_time(anchor, task.num_pushed, policy.delay_seconds, policy.retry_seconds);

            if eligible_at <= now {
                task.num_pushed += 1;
                promoted.push(PromotedTask {
                    id: task.id,
                    bg_worker_task: task.bg_worker_task.clone(),
                    num_pushed: task.num_pushed,
                });
            }
        }

        Ok(promoted)
    }

    async fn load(&self, id: TaskId) -> anyhow::Result<Option<Task>> {
        Ok(self.tasks.lock().await.get(&id).cloned())
    }

    async fn delete(&self, id: TaskId) -> anyhow::Result<()> {
        self.tasks.lock().await.remove(&id);
        Ok(())
    }
}
