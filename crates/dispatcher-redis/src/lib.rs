//! Redis implementation of the dispatcher's shared queue (C2) and distributed
//! lease service (C3).
//!
//! Both live on the same connection because in production they share one
//! Redis (or Redis Cluster) deployment; keeping them as separate traits
//! ([`dispatcher_core::QueueStore`], [`dispatcher_core::LeaseStore`]) still
//! lets tests swap in the in-memory fakes from `dispatcher-testing`
//! independently.

pub mod lease;
pub mod queue;

pub use lease::RedisLeaseStore;
pub use queue::RedisQueueStore;

use redis::aio::ConnectionManager;

/// Connect a `ConnectionManager`, which transparently reconnects on
/// transient connectivity errors (§7.1) rather than requiring callers to
/// retry by hand.
pub async fn connect(redis_uri: &str) -> anyhow::Result<ConnectionManager> {
    let client = redis::Client::open(redis_uri)
        .map_err(|e| anyhow::anyhow!("invalid redis uri: {e}"))?;
    let conn = client
        .get_connection_manager()
        .await
        .map_err(|e| anyhow::anyhow!("connecting to redis: {e}"))?;
    Ok(conn)
}
