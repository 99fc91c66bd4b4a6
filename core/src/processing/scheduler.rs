use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::telemetry::log::LogManager;

/// Cadence of the roster scan.
pub const SCAN_INTERVAL: Duration = Duration::from_secs(2);

/// Cadence of breadcrumb recording.
pub const BREADCRUMB_INTERVAL: Duration = Duration::from_secs(5);

/// Fixed-rate background job that can be cancelled.
///
/// The first run happens one full period after spawning. Each run of `body`
/// completes before cancellation is observed, and no run starts after
/// [`PeriodicTask::stop`] returns or the task is dropped.
pub struct PeriodicTask {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
    cancel_token: CancellationToken,
}

impl PeriodicTask {
    /// Must be called from within a tokio runtime.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut body: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => body().await,
                }
            }
        });

        LogManager::new("scheduler").record(&format!("{} task every {:?}", name, period));
        Self {
            name,
            handle: Some(handle),
            cancel_token,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Cancels the task and waits for an in-flight run to finish.
    pub async fn stop(mut self) {
        self.cancel_token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                LogManager::new("scheduler")
                    .transient(&format!("{} task ended abnormally: {}", self.name, err));
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
