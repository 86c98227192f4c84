//! PostgreSQL implementation of the dispatcher's durable task store (C1).
//!
//! This crate provides the production implementation of the
//! [`dispatcher_core::TaskStore`] trait used by the queuer and runner loops.
//!
//! # Features
//!
//! - `FOR UPDATE SKIP LOCKED` combined select+bump, so concurrent queuer
//!   instances are correct but redundant rather than racy (§4.1, §4.5).
//! - A per-worker linear backoff schedule computed inside the database via a
//!   precomputed `CASE` expression (see [`eligibility::EligibilityExpr`]).
//! - `execute_after` overrides `creation_time` as the backoff anchor when set.
//!
//! # Database Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id              BIGSERIAL PRIMARY KEY,
//!     bg_worker_task  TEXT NOT NULL,
//!     creation_time   TIMESTAMPTZ NOT NULL DEFAULT now(),
//!     num_pushed      INTEGER NOT NULL DEFAULT 0,
//!     params          JSONB NOT NULL DEFAULT '{}'::jsonb,
//!     execute_after   TIMESTAMPTZ
//! );
//!
//! CREATE INDEX idx_tasks_eligibility ON tasks (bg_worker_task, num_pushed, creation_time);
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use dispatcher_postgres::PgTaskStore;
//! use sqlx::PgPool;
//!
//! let pool = PgPool::connect("postgres://localhost/monitoring").await?;
//! let store = PgTaskStore::new(pool, &registry.policies());
//! ```

pub mod eligibility;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dispatcher_core::registry::WorkerPolicy;
use dispatcher_core::task::{NewTask, PromotedTask, Task, TaskId};
use dispatcher_core::TaskStore;
use eligibility::EligibilityExpr;
use sqlx::{PgPool, Row};

/// PostgreSQL-backed task store.
#[derive(Clone)]
pub struct PgTaskStore {
    pool: PgPool,
    eligibility: std::sync::Arc<EligibilityExpr>,
}

impl PgTaskStore {
    /// Build a store whose eligibility expression is derived once from the
    /// worker registry's policies (§4.1, §9 — "dynamic case-expression
    /// building" becomes a precomputed pure function of the registry).
    pub fn new(pool: PgPool, policies: &[WorkerPolicy]) -> Self {
        Self {
            pool,
            eligibility: std::sync::Arc::new(EligibilityExpr::build(policies)),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn insert(&self, task: NewTask) -> anyhow::Result<TaskId> {
        let row = sqlx::query(
            r#"
            INSERT INTO tasks (bg_worker_task, params, execute_after)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&task.bg_worker_task)
        .bind(&task.params)
        .bind(task.execute_after)
        .fetch_one(&self.pool)
        .await
        .context("inserting task row")?;

        Ok(row.get("id"))
    }

    async fn promote_eligible(&self) -> anyhow::Result<Vec<PromotedTask>> {
        let sql = self.eligibility.promote_eligible_sql();
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .context("promoting eligible tasks")?;

        Ok(rows
            .into_iter()
            .map(|row| PromotedTask {
                id: row.get("id"),
                bg_worker_task: row.get("bg_worker_task"),
                num_pushed: row.get("num_pushed"),
            })
            .collect())
    }

    async fn load(&self, id: TaskId) -> anyhow::Result<Option<Task>> {
        let row = sqlx::query(
            r#"
            SELECT id, bg_worker_task, creation_time, num_pushed, params, execute_after
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("loading task row")?;

        Ok(row.map(|row| Task {
            id: row.get("id"),
            bg_worker_task: row.get("bg_worker_task"),
            creation_time: row.get::<DateTime<Utc>, _>("creation_time"),
            num_pushed: row.get("num_pushed"),
            params: row.get("params"),
            execute_after: row.get("execute_after"),
        }))
    }

    async fn delete(&self, id: TaskId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("deleting task row")?;
        Ok(())
    }
}

/// Build a connection pool with the pooling policy from §5: capped size,
/// overflow-equivalent handled by `sqlx`'s pool itself, pre-ping enabled so
/// stale connections are detected before use.
pub async fn connect_pool(database_uri: &str, pool_size: u32) -> anyhow::Result<PgPool> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(pool_size)
        .test_before_acquire(true)
        .connect(database_uri)
        .await
        .context("connecting to postgres")
}
