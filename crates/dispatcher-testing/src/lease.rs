//! In-memory fake of [`LeaseStore`] (C3): a mutex-guarded map from lock name
//! to `(owner_token, expiry)`, honoring the same TTL-expiry-then-reclaim
//! semantics the Redis implementation provides (§4.3, §8 properties 1 and 3).

use async_trait::async_trait;
use dispatcher_core::error::DispatcherError;
use dispatcher_core::lease::{LeaseHandle, LeaseStore};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

struct Entry {
    owner_token: Uuid,
    expires_at: Instant,
}

#[derive(Default)]
pub struct InMemoryLeaseStore {
    leases: Mutex<HashMap<String, Entry>>,
}

impl InMemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaseStore for InMemoryLeaseStore {
    async fn acquire(&self, name: &str, ttl: Duration) -> anyhow::Result<Option<LeaseHandle>> {
        let mut leases = self.leases.lock().await;
        let now = Instant::now();

        if let Some(existing) = leases.get(name) {
            if existing.expires_at > now {
                return Ok(None);
            }
        }

        let handle = LeaseHandle::new(name, ttl);
        leases.insert(
            name.to_string(),
            Entry {
                owner_token: handle.owner_token,
                expires_at: now + ttl,
            },
        );
        Ok(Some(handle))
    }

    async fn extend(&self, handle: &LeaseHandle) -> anyhow::Result<()> {
        let mut leases = self.leases.lock().await;
        match leases.get_mut(&handle.name) {
            Some(entry) if entry.owner_token == handle.owner_token && entry.expires_at > Instant::now() => {
                entry.expires_at = Instant::now() + handle.ttl;
                Ok(())
            }
            _ => Err(DispatcherError::LeaseNotOwned(handle.name.clone()).into()),
        }
    }

    async fn release(&self, handle: &LeaseHandle) -> anyhow::Result<()> {
        let mut leases = self.leases.lock().await;
        match leases.get(&handle.name) {
            Some(entry) if entry.owner_token == handle.owner_token && entry.expires_at > Instant::now() => {
                leases.remove(&handle.name);
                Ok(())
            }
            _ => Err(DispatcherError::LeaseNotOwned(handle.name.clone()).into()),
        }
    }
}
