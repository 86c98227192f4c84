//! The per-process coordination resources (§9 "Resources"): the
//! database-backed task store and the Redis-backed queue and lease stores,
//! built once by the supervisor and shared by reference (`Arc`) across every
//! queuer/runner task. Deployment-specific worker dependencies (HTTP clients,
//! extra database pools, ...) are a separate, generic concern — see
//! [`crate::runner::Runner`], which carries them alongside this bundle rather
//! than folding them in here, so the queuer never has to know about a type
//! parameter it has no use for.

use dispatcher_core::{LeaseStore, QueueStore, TaskStore};
use std::sync::Arc;

/// Coordination resources shared by the queuer and runner loops, independent
/// of whatever extra dependencies a given deployment's workers need.
#[derive(Clone)]
pub struct Resources {
    pub store: Arc<dyn TaskStore>,
    pub queue: Arc<dyn QueueStore>,
    pub leases: Arc<dyn LeaseStore>,
}

impl Resources {
    pub fn new(
        store: Arc<dyn TaskStore>,
        queue: Arc<dyn QueueStore>,
        leases: Arc<dyn LeaseStore>,
    ) -> Self {
        Self {
            store,
            queue,
            leases,
        }
    }
}
