//! In-memory fakes of the dispatcher's store/queue/lease contracts (C11,
//! §4.11), used by the property and end-to-end scenario tests in §8.
//!
//! Each fake honors the same atomicity contract its production counterpart
//! does — a `tokio::sync::Mutex` stands in for row-level locks / Redis's
//! single-threaded command execution — so a test written against these fakes
//! exercises real races, not a simplified model of them.

pub mod clock;
pub mod lease;
pub mod queue;
pub mod store;

pub use clock::TestClock;
pub use lease::InMemoryLeaseStore;
pub use queue::InMemoryQueueStore;
pub use store::InMemoryTaskStore;

#[cfg(test)]
mod fake_tests;
