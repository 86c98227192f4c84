//! Contract for the distributed lease service (C3, §4.3).

use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

/// A held lease. Carries enough to let the owning store verify ownership on
/// `extend`/`release` (the owner token), and the name it was acquired under.
#[derive(Debug, Clone)]
pub struct LeaseHandle {
    pub name: String,
    pub owner_token: Uuid,
    pub ttl: Duration,
}

impl LeaseHandle {
    pub fn new(name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            owner_token: Uuid::new_v4(),
            ttl,
        }
    }

    /// The Redis key pattern from §3: `task-runner:{task_id}`.
    pub fn key_for_task(task_id: crate::task::TaskId) -> String {
        format!("task-runner:{task_id}")
    }
}

/// Named, time-bounded, owner-identified locks on the shared store.
///
/// `release` failing with [`crate::error::DispatcherError::LeaseNotOwned`] means
/// the TTL expired and another owner has since claimed the same name — callers
/// must log this and continue, never propagate it as fatal (§4.3, §7).
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Non-blocking acquire. `None` if another owner currently holds the lease.
    async fn acquire(&self, name: &str, ttl: Duration) -> anyhow::Result<Option<LeaseHandle>>;

    /// Reset the TTL on a lease this caller still owns.
    async fn extend(&self, handle: &LeaseHandle) -> anyhow::Result<()>;

    /// Release a held lease. Implementations return
    /// [`crate::error::DispatcherError::LeaseNotOwned`] (not a generic error)
    /// when the lease was already reclaimed, so callers can match on it.
    async fn release(&self, handle: &LeaseHandle) -> anyhow::Result<()>;
}
