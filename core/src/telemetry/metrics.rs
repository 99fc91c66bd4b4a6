use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Counters shared between the periodic tasks and the presentation bridge.
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub scan_ticks: usize,
    pub breadcrumbs: usize,
    pub alerts: usize,
    pub skipped: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_scan_tick(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.scan_ticks += 1;
        }
    }

    pub fn record_breadcrumb(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.breadcrumbs += 1;
        }
    }

    pub fn record_alerts(&self, count: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.alerts += count;
        }
    }

    pub fn record_skipped(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.skipped += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsRecorder::new();
        metrics.record_scan_tick();
        metrics.record_scan_tick();
        metrics.record_alerts(3);
        metrics.record_breadcrumb();
        metrics.record_skipped();
        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                scan_ticks: 2,
                breadcrumbs: 1,
                alerts: 3,
                skipped: 1,
            }
        );
    }
}
