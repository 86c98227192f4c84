//! Process bootstrap (C7, §4.7): settings, connections, tracing, and the
//! cancellation plumbing shared by both binaries.

use crate::resources::Resources;
use dispatcher_core::Settings;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a `tracing-subscriber` registry honoring `RUST_LOG`, falling back
/// to `settings.loglevel` (§4.8, §4.10) when the environment variable isn't
/// set. File rotation (`logfile`/`logfile_backup_count`/`logfile_maxsize`)
/// is a deployment concern left to the process supervisor (systemd, k8s) —
/// this binary only ever writes to stdout, matching how the source's
/// `RotatingFileHandler` setup is itself optional and stdout-first.
pub fn init_tracing(settings: &Settings) {
    let default_filter = settings.loglevel.to_lowercase();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Connect the coordination resources shared by the queuer and every runner
/// loop: the Postgres task store and the Redis queue/lease stores, built from
/// one shared `ConnectionManager` (§9 "Resources").
pub async fn connect_resources(
    settings: &Settings,
    policies: &[dispatcher_core::registry::WorkerPolicy],
) -> anyhow::Result<Resources> {
    let pool = dispatcher_postgres::connect_pool(&settings.database_uri, settings.pool_size).await?;
    let store = Arc::new(dispatcher_postgres::PgTaskStore::new(pool, policies));

    let conn = dispatcher_redis::connect(&settings.redis_uri).await?;
    let queue = Arc::new(dispatcher_redis::RedisQueueStore::new(conn.clone()));
    let leases = Arc::new(dispatcher_redis::RedisLeaseStore::new(conn));

    Ok(Resources::new(store, queue, leases))
}

/// A token cancelled on ctrl-c (or SIGTERM where supported), so both the
/// queuer and runner main loops can shut down between iterations instead of
/// being killed mid-transaction (§5, §9).
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let watched = token.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
        watched.cancel();
    });
    token
}
