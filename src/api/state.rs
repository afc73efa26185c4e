//! API shared state

use std::sync::Arc;

use crate::scheduler::AlarmScheduler;
use crate::service::AlarmService;
use crate::store::AlarmStore;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// The typed alarm surface (upsert/delete/describe)
    pub service: Arc<AlarmService>,

    /// Scheduler, for the diagnostic endpoint only
    pub scheduler: Arc<AlarmScheduler>,

    /// Store, for health reporting
    pub store: Arc<dyn AlarmStore>,
}

impl ApiState {
    pub fn new(
        service: Arc<AlarmService>,
        scheduler: Arc<AlarmScheduler>,
        store: Arc<dyn AlarmStore>,
    ) -> Self {
        Self {
            service,
            scheduler,
            store,
        }
    }
}
