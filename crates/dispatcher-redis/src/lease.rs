//! Redis implementation of [`LeaseStore`] (C3, §4.3): a named, TTL-bounded,
//! owner-identified lock keyed `task-runner:{task_id}`.
//!
//! `extend` and `release` are compare-and-act Lua scripts rather than plain
//! `EXPIRE`/`DEL`, so a caller can never extend or release a lease it no
//! longer owns after the TTL expired and another runner claimed it.

use async_trait::async_trait;
use dispatcher_core::error::DispatcherError;
use dispatcher_core::lease::{LeaseHandle, LeaseStore};
use once_cell::sync::Lazy;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::time::Duration;

/// `KEYS[1]` = lock name, `ARGV[1]` = expected owner token, `ARGV[2]` = new
/// TTL in milliseconds. Returns 1 if extended, 0 if this caller no longer
/// owns the lock.
static EXTEND_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        if redis.call("GET", KEYS[1]) == ARGV[1] then
            return redis.call("PEXPIRE", KEYS[1], ARGV[2])
        else
            return 0
        end
        "#,
    )
});

/// `KEYS[1]` = lock name, `ARGV[1]` = expected owner token. Returns 1 if
/// deleted, 0 if this caller no longer owns the lock.
static RELEASE_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        if redis.call("GET", KEYS[1]) == ARGV[1] then
            return redis.call("DEL", KEYS[1])
        else
            return 0
        end
        "#,
    )
});

#[derive(Clone)]
pub struct RedisLeaseStore {
    conn: ConnectionManager,
}

impl RedisLeaseStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl LeaseStore for RedisLeaseStore {
    async fn acquire(&self, name: &str, ttl: Duration) -> anyhow::Result<Option<LeaseHandle>> {
        let handle = LeaseHandle::new(name, ttl);
        let mut conn = self.conn.clone();

        // SET key token NX PX ttl_ms: create the lock iff absent.
        let ok: Option<String> = redis::cmd("SET")
            .arg(name)
            .arg(handle.owner_token.to_string())
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("redis SET NX failed: {e}"))?;

        Ok(ok.map(|_| handle))
    }

    async fn extend(&self, handle: &LeaseHandle) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        let extended: i64 = EXTEND_SCRIPT
            .key(&handle.name)
            .arg(handle.owner_token.to_string())
            .arg(handle.ttl.as_millis() as u64)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("redis EXTEND script failed: {e}"))?;

        if extended == 1 {
            Ok(())
        } else {
            Err(DispatcherError::LeaseNotOwned(handle.name.clone()).into())
        }
    }

    async fn release(&self, handle: &LeaseHandle) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        let released: i64 = RELEASE_SCRIPT
            .key(&handle.name)
            .arg(handle.owner_token.to_string())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("redis RELEASE script failed: {e}"))?;

        if released == 1 {
            Ok(())
        } else {
            // Expired and reclaimed by another owner: recoverable, the
            // caller must log this and move on (§4.3, §7.4).
            Err(DispatcherError::LeaseNotOwned(handle.name.clone()).into())
        }
    }
}
