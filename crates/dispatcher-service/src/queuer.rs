//! Queuer loop (C5, §4.5): periodically promotes eligible tasks from the
//! task store into the shared queue.

use crate::resources::Resources;
use chrono::Utc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

pub struct Queuer {
    resources: Resources,
    run_interval: Duration,
    push_retry_attempts: u32,
}

impl Queuer {
    pub fn new(resources: Resources, run_interval: Duration) -> Self {
        Self::with_push_retry_attempts(resources, run_interval, 3)
    }

    pub fn with_push_retry_attempts(
        resources: Resources,
        run_interval: Duration,
        push_retry_attempts: u32,
    ) -> Self {
        Self {
            resources,
            run_interval,
            push_retry_attempts,
        }
    }

    /// Run until `cancel` fires. One iteration = one promote-and-push batch
    /// followed by a sleep of `run_interval` (§4.5 algorithm).
    pub async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("queuer loop cancelled");
                    return Ok(());
                }
                result = self.run_iteration() => {
                    if let Err(err) = result {
                        // Database transience propagates out (§7.2): the
                        // supervisor restarts the process. Queue connectivity
                        // is already contained inside run_iteration.
                        return Err(err);
                    }
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("queuer loop cancelled during sleep");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.run_interval) => {}
            }
        }
    }

    async fn run_iteration(&self) -> anyhow::Result<()> {
        let span = info_span!("queuer_iteration");
        async {
            let start = std::time::Instant::now();
            let pushed = self.move_tasks_to_queue().await?;
            info!(num_pushed = pushed, duration_ms = start.elapsed().as_millis() as u64, "queuer iteration complete");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// The combined select-for-update-skip-locked + bump + push batch from
    /// §4.1/§4.5. `promote_eligible` commits on its own; each push gets
    /// `push_retry_attempts` retries before being abandoned for this
    /// iteration (§9 Open Questions) — an abandoned push delays that task's
    /// next promotion but never loses it.
    async fn move_tasks_to_queue(&self) -> anyhow::Result<usize> {
        let promoted = self.resources.store.promote_eligible().await?;
        if promoted.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().timestamp();
        let mut pushed = 0;

        for task in &promoted {
            match self.push_with_retry(task.id, now).await {
                Ok(created) => {
                    if created {
                        pushed += 1;
                    }
                    info!(
                        task_id = task.id,
                        worker = %task.bg_worker_task,
                        num_pushed = task.num_pushed,
                        "pushed task"
                    );
                }
                Err(err) => {
                    // Queue unreachable (§7.1) even after retrying: this
                    // task's promotion already committed, but without a push
                    // it's simply delayed, not lost, until a later iteration's
                    // higher backoff threshold is crossed.
                    warn!(task_id = task.id, error = %err, "failed to push promoted task onto queue after retrying");
                }
            }
        }

        Ok(pushed)
    }

    async fn push_with_retry(&self, task_id: i64, score: i64) -> anyhow::Result<bool> {
        let mut last_err = None;
        for attempt in 0..=self.push_retry_attempts {
            match self.resources.queue.push_if_absent(task_id, score).await {
                Ok(created) => return Ok(created),
                Err(err) => {
                    warn!(task_id, attempt, error = %err, "push attempt failed");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.expect("loop runs at least once"))
    }
}
