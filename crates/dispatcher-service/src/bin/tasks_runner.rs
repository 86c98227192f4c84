//! Entry point for the runner process (§4.6): pops queued task ids, acquires
//! their lease, and dispatches to the registered worker.
//!
//! Business worker implementations are out of scope (§1 Non-goals) — this is
//! the single place a deployment registers its own
//! [`dispatcher_core::Worker`] types, by extending the `WorkerRegistry`
//! builder chain below and swapping in a real resources type in place of `()`.

use dispatcher_core::{Settings, WorkerRegistry};
use dispatcher_service::supervisor::{connect_resources, init_tracing, shutdown_token};
use dispatcher_service::Runner;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings);

    // Integration point: `.register(MyWorker::new(...))` for each worker type
    // this deployment runs, with `()` replaced by whatever shared resources
    // those workers need (HTTP clients, extra pools, ...).
    let registry: WorkerRegistry<()> = WorkerRegistry::builder().build();
    if registry.is_empty() {
        info!("no workers registered; runner will log UnknownWorker for every popped task");
    }

    let resources = connect_resources(&settings, &registry.policies()).await?;
    let runner = Runner::new(
        resources,
        Arc::new(registry),
        (),
        settings.num_workers,
        settings.pop_timeout(),
        settings.lease_ttl(),
    );

    let cancel = shutdown_token();
    info!(num_workers = settings.num_workers, "runner starting");
    if let Err(err) = runner.run(cancel).await {
        error!(error = %err, "runner exited with error");
        return Err(err);
    }

    info!("runner shut down cleanly");
    Ok(())
}
