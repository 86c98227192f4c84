//! # dispatcher-service
//!
//! Wires [`dispatcher_core`]'s traits to the [`dispatcher_postgres`] and
//! [`dispatcher_redis`] implementations and runs the two processes described
//! in §4.5/§4.6: the queuer (promotes eligible tasks into the shared queue)
//! and the runner (pops entries, acquires a lease, dispatches to a worker).
//!
//! Business worker registration (§4.4, §1 Non-goals — handler bodies are
//! out of scope) is left to the binary: see `src/bin/tasks_runner.rs` for the
//! single integration point a deployment adds its own
//! [`dispatcher_core::Worker`] implementations at.

pub mod queuer;
pub mod resources;
pub mod runner;
pub mod supervisor;

#[cfg(test)]
mod scenario_tests;

pub use queuer::Queuer;
pub use resources::Resources;
pub use runner::Runner;
