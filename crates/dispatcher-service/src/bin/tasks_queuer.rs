//! Entry point for the queuer process (§4.5): promotes eligible tasks from
//! the durable store into the shared queue on a fixed interval.

use dispatcher_core::{Settings, WorkerRegistry};
use dispatcher_service::supervisor::{connect_resources, init_tracing, shutdown_token};
use dispatcher_service::Queuer;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings);

    // The queuer only needs worker *policies* (queue_name/delay/retry), never
    // the handler bodies, so it builds an empty `WorkerRegistry<()>` purely to
    // reuse `WorkerRegistry::policies()` — register the same workers here as
    // in `tasks_runner.rs` if per-worker timing policy diverges from the
    // fallback in `dispatcher_core::registry::UNKNOWN_WORKER_RETRY_SECONDS`.
    let registry: WorkerRegistry<()> = WorkerRegistry::builder().build();
    if registry.is_empty() {
        info!("no workers registered; all tasks use the unknown-worker fallback policy");
    }

    let resources = connect_resources(&settings, &registry.policies()).await?;
    let queuer = Queuer::with_push_retry_attempts(
        resources,
        Duration::from_secs(settings.queuer_run_interval),
        settings.cluster_error_retry_attempts,
    );

    let cancel = shutdown_token();
    info!(run_interval = settings.queuer_run_interval, "queuer starting");
    if let Err(err) = queuer.run(cancel).await {
        error!(error = %err, "queuer exited with error");
        return Err(err);
    }

    info!("queuer shut down cleanly");
    Ok(())
}
