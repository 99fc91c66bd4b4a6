use log::{debug, info, warn};

use crate::prelude::TrackingError;

/// Component-tagged wrapper over the `log` facade.
pub struct LogManager {
    component: &'static str,
}

impl LogManager {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.component, message);
    }

    /// Expected no-ops (duplicate ids, pins without a fix) stay at debug.
    pub fn skipped(&self, error: &TrackingError) {
        debug!("[{}] skipped: {}", self.component, error);
    }

    pub fn transient(&self, message: &str) {
        warn!("[{}] {}", self.component, message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("meshcore")
    }
}
