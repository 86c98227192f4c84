//! In-memory fake of [`QueueStore`] (C2): a score-ordered map guarded by a
//! mutex, with a `Notify` so `blocking_pop_min` can actually block (and wake
//! promptly on push) rather than poll — exercising the same "exactly one
//! caller wins a given entry" contract real consumers depend on (§4.2, §8
//! property 1 and 6).

use async_trait::async_trait;
use dispatcher_core::queue::{QueueEntry, QueueStore};
use dispatcher_core::task::TaskId;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::timeout;

#[derive(Default)]
pub struct InMemoryQueueStore {
    entries: Mutex<HashMap<TaskId, i64>>,
    notify: Notify,
}

impl InMemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl QueueStore for InMemoryQueueStore {
    async fn push_if_absent(&self, task_id: TaskId, score: i64) -> anyhow::Result<bool> {
        let mut entries = self.entries.lock().await;
        let inserted = if entries.contains_key(&task_id) {
            false
        } else {
            entries.insert(task_id, score);
            true
        };
        drop(entries);
        if inserted {
            self.notify.notify_waiters();
        }
        Ok(inserted)
    }

    async fn blocking_pop_min(&self, wait: Duration) -> anyhow::Result<Option<QueueEntry>> {
        let deadline = tokio::time::Instant::now() + wait;

        loop {
            {
                let mut entries = self.entries.lock().await;
                let min = entries
                    .iter()
                    .min_by_key(|&(_, score)| *score)
                    .map(|(&task_id, &score)| (task_id, score));
                if let Some((task_id, score)) = min {
                    entries.remove(&task_id);
                    return Ok(Some(QueueEntry {
                        task_id,
                        queued_at: score,
                    }));
                }
            }

            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            // Wake on push or on timeout, whichever comes first.
            let _ = timeout(remaining, self.notify.notified()).await;
        }
    }
}
