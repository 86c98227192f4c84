//! Redis sorted-set implementation of [`QueueStore`] (C2, §4.2).

use async_trait::async_trait;
use dispatcher_core::queue::{QueueEntry, QueueStore, GLOBAL_TASK_QUEUE};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

/// Shared task queue backed by a Redis sorted set (`ZADD ... NX` /
/// `BZPOPMIN`), matching the `global-task-queue` key from §6.
#[derive(Clone)]
pub struct RedisQueueStore {
    conn: ConnectionManager,
    key: String,
}

impl RedisQueueStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self::with_key(conn, GLOBAL_TASK_QUEUE)
    }

    pub fn with_key(conn: ConnectionManager, key: impl Into<String>) -> Self {
        Self {
            conn,
            key: key.into(),
        }
    }
}

#[async_trait]
impl QueueStore for RedisQueueStore {
    async fn push_if_absent(&self, task_id: i64, score: i64) -> anyhow::Result<bool> {
        let mut conn = self.conn.clone();
        // NX is an option flag on ZADD, not a distinct command, so this goes
        // through raw `cmd` rather than a generated `AsyncCommands` method
        // (mirrors `SET NX PX` in lease.rs). Only adds if the member (task
        // id) is not already present, so a task already queued is never
        // double-counted (§4.2, §8 property 6).
        let added: i64 = redis::cmd("ZADD")
            .arg(&self.key)
            .arg("NX")
            .arg(score)
            .arg(task_id)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("redis ZADD NX failed: {e}"))?;
        Ok(added > 0)
    }

    async fn blocking_pop_min(&self, timeout: Duration) -> anyhow::Result<Option<QueueEntry>> {
        let mut conn = self.conn.clone();
        // BZPOPMIN returns (key, member, score) or nil on timeout.
        let result: Option<(String, i64, i64)> = conn
            .bzpopmin(&self.key, timeout.as_secs_f64())
            .await
            .map_err(|e| anyhow::anyhow!("redis BZPOPMIN failed: {e}"))?;

        Ok(result.map(|(_, task_id, score)| QueueEntry {
            task_id,
            queued_at: score,
        }))
    }
}
