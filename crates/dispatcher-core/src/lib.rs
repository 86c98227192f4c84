//! # dispatcher-core
//!
//! Shared types and traits for the background-task dispatcher: a durable,
//! distributed queue that turns rows in a task table into at-most-one-
//! concurrent-execution handler invocations, fanned out across many runner
//! processes.
//!
//! ## Core Concepts
//!
//! The dispatcher separates **storage** from **coordination**:
//! - [`store::TaskStore`] = durable home for task rows (Postgres).
//! - [`queue::QueueStore`] + [`lease::LeaseStore`] = ephemeral coordination
//!   (Redis): "what's next" and "who's running it right now".
//!
//! The key principle: **one task, one lease, one concurrent runner**. A
//! worker never needs to coordinate with other workers directly — the lease
//! service is the single source of truth for "am I allowed to run this".
//!
//! ## Architecture
//!
//! ```text
//! producer
//!     │ insert()
//!     ▼
//! TaskStore (C1, Postgres) ───────────────────────────┐
//!     │ promote_eligible()                            │
//!     ▼ queuer loop                                    │
//! QueueStore (C2, Redis sorted set)                    │
//!     │ blocking_pop_min()                             │
//!     ▼ runner loop                                    │
//! LeaseStore (C3, Redis lock) ── acquire() ──► Worker  │
//!     │                                         │      │
//!     │                                  run() success │
//!     │                                         ▼      │
//!     └─────────────────────────────────  delete() ────┘
//! ```
//!
//! ## Key Invariants
//!
//! 1. **Tasks are durable facts** — a row exists iff the work is unacknowledged.
//! 2. **`num_pushed` only grows** — the backoff schedule is a pure function of it.
//! 3. **One lease per task id at any instant** — enforced by the lease store, not by convention.
//! 4. **Workers are idempotent-adjacent** — at-most-one-concurrent, not exactly-once.
//! 5. **No silent plugin discovery** — the registry is built explicitly at startup.
//!
//! ## What This Is Not
//!
//! The dispatcher is **not**:
//! - An event-sourcing or saga engine.
//! - A FIFO queue (equal-eligibility tasks may interleave).
//! - A replacement for application-level idempotency.

pub mod config;
pub mod error;
pub mod lease;
pub mod queue;
pub mod registry;
pub mod store;
pub mod task;
pub mod worker;

#[cfg(test)]
mod backoff_tests;

pub use config::Settings;
pub use error::{Categorizable, DispatcherError, SafeErrorCategory};
pub use lease::{LeaseHandle, LeaseStore};
pub use queue::{QueueEntry, QueueStore};
pub use registry::{WorkerPolicy, WorkerRegistry, WorkerRegistryBuilder};
pub use store::TaskStore;
pub use task::{NewTask, PromotedTask, Task, TaskId};
pub use worker::{Worker, WorkerContext};

// Re-export commonly used external types
pub use async_trait::async_trait;
