use crate::generator::devices::simulated_device_ids;
use crate::generator::location::LocationWalk;
use crate::gui_bridge::model::{radar_blips, VisualizationModel};
use crate::workflow::config::WorkflowConfig;
use chrono::{Duration as ChronoDuration, Utc};
use meshcore::device_interface::{Capabilities, DeviceDescriptor, LocationFix, Poi, PoiKind};
use meshcore::math::Bounds;
use meshcore::processing::{
    AlertDispatcher, AlertIntent, DriftSampler, PeriodicTask, RosterEngine, RosterSummary,
    TickReport, TrailProjector,
};
use meshcore::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use meshcore::{CalibrationConfig, HapticSink, TrackingError, TrackingResult};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{watch, Mutex};

type Roster = RosterEngine<DriftSampler<StdRng>>;
type Haptics = Box<dyn HapticSink + Send + Sync>;

/// Summary of an offline run.
pub struct WorkflowResult {
    pub ticks: usize,
    pub alerts: Vec<AlertIntent>,
    pub summary: RosterSummary,
    pub breadcrumbs: usize,
    pub bounds: Option<Bounds>,
}

struct Session {
    config: WorkflowConfig,
    capabilities: Capabilities,
    test_mode: AtomicBool,
    roster: Mutex<Roster>,
    trail: Mutex<TrailProjector>,
    dispatcher: AlertDispatcher<Haptics>,
    metrics: MetricsRecorder,
    logger: LogManager,
    recent_alerts: Mutex<Vec<AlertIntent>>,
    scan_task: Mutex<Option<PeriodicTask>>,
    trail_task: Mutex<Option<PeriodicTask>>,
    location_task: Mutex<Option<PeriodicTask>>,
    snapshots: watch::Sender<VisualizationModel>,
}

/// Owns one tracking session: the roster, the trail, and the periodic tasks
/// that drive them. Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct Runner {
    session: Arc<Session>,
}

impl Runner {
    pub fn new(config: WorkflowConfig, haptics: Haptics) -> Self {
        let sampler = DriftSampler::new(StdRng::seed_from_u64(config.seed));
        let roster = RosterEngine::with_calibration(sampler, config.to_calibration());
        let (snapshots, _) = watch::channel(VisualizationModel::default());

        Self {
            session: Arc::new(Session {
                capabilities: config.capabilities(),
                test_mode: AtomicBool::new(config.test_mode),
                roster: Mutex::new(roster),
                trail: Mutex::new(TrailProjector::new()),
                dispatcher: AlertDispatcher::new(haptics),
                metrics: MetricsRecorder::new(),
                logger: LogManager::new("runner"),
                recent_alerts: Mutex::new(Vec::new()),
                scan_task: Mutex::new(None),
                trail_task: Mutex::new(None),
                location_task: Mutex::new(None),
                snapshots,
                config,
            }),
        }
    }

    pub fn is_test_mode(&self) -> bool {
        self.session.test_mode.load(Ordering::SeqCst)
    }

    /// Links configured paired devices and, when pairing is unavailable or
    /// test mode is on, the simulated roster.
    pub async fn seed_roster(&self, paired: &[DeviceDescriptor]) -> usize {
        let now = Utc::now();
        let mut added = 0;
        {
            let mut roster = self.session.roster.lock().await;
            for descriptor in paired {
                if roster.add_member(descriptor, now) {
                    added += 1;
                }
            }
            if !self.session.capabilities.pairing || self.is_test_mode() {
                let ids = simulated_device_ids(
                    self.session.config.simulated_members,
                    self.session.config.seed,
                );
                for id in ids {
                    if roster.add_simulated(id, now) {
                        added += 1;
                    }
                }
            }
        }
        self.publish().await;
        added
    }

    /// Ingests a device from the pairing layer. Duplicates are a no-op.
    pub async fn pair_device(&self, descriptor: &DeviceDescriptor) -> bool {
        let added = self
            .session
            .roster
            .lock()
            .await
            .add_member(descriptor, Utc::now());
        if !added {
            self.session.metrics.record_skipped();
        }
        self.publish().await;
        added
    }

    pub async fn set_test_mode(&self, enabled: bool) {
        self.session.test_mode.store(enabled, Ordering::SeqCst);
        self.publish().await;
    }

    /// Starts or stops the scan task. Starting requires pairing or test mode.
    pub async fn set_scanning(&self, enabled: bool) -> TrackingResult<bool> {
        if enabled {
            self.session
                .capabilities
                .ensure_can_scan(self.is_test_mode())?;
        }

        let mut slot = self.session.scan_task.lock().await;
        self.session.roster.lock().await.set_scanning(enabled);
        if enabled {
            if slot.is_none() {
                let weak = Arc::downgrade(&self.session);
                *slot = Some(PeriodicTask::spawn(
                    "scan",
                    self.session.config.scan_interval(),
                    move || {
                        let weak = weak.clone();
                        async move {
                            if let Some(runner) = Runner::upgrade(&weak) {
                                runner.scan_once().await;
                            }
                        }
                    },
                ));
            }
        } else if let Some(task) = slot.take() {
            task.stop().await;
        }
        drop(slot);

        self.publish().await;
        Ok(enabled)
    }

    /// Starts or stops breadcrumb recording.
    pub async fn set_recording(&self, enabled: bool) -> bool {
        let mut slot = self.session.trail_task.lock().await;
        self.session.trail.lock().await.set_recording(enabled);
        if enabled {
            if slot.is_none() {
                let weak = Arc::downgrade(&self.session);
                *slot = Some(PeriodicTask::spawn(
                    "breadcrumb",
                    self.session.config.breadcrumb_interval(),
                    move || {
                        let weak = weak.clone();
                        async move {
                            if let Some(runner) = Runner::upgrade(&weak) {
                                runner.record_once().await;
                            }
                        }
                    },
                ));
            }
        } else if let Some(task) = slot.take() {
            task.stop().await;
        }
        drop(slot);

        self.publish().await;
        enabled
    }

    /// Pushes simulated fixes into the session until shutdown.
    pub async fn start_location_feed(&self, mut walk: LocationWalk) -> TrackingResult<()> {
        if !self.session.capabilities.location {
            return Err(TrackingError::UpstreamUnavailable(
                "no location capability; trail runs without fixes".into(),
            ));
        }
        let mut slot = self.session.location_task.lock().await;
        if slot.is_none() {
            let weak = Arc::downgrade(&self.session);
            *slot = Some(PeriodicTask::spawn(
                "location",
                self.session.config.location_interval(),
                move || {
                    let fix = walk.next_fix();
                    let weak = weak.clone();
                    async move {
                        if let Some(runner) = Runner::upgrade(&weak) {
                            let _ = runner.ingest_fix(fix).await;
                        }
                    }
                },
            ));
        }
        Ok(())
    }

    /// One scan pass: tick the roster, then fire the resulting alerts.
    pub async fn scan_once(&self) -> TickReport {
        let (report, scanned) = {
            let mut roster = self.session.roster.lock().await;
            (roster.tick(Utc::now()), roster.is_scanning())
        };
        if scanned {
            self.handle_report(&report).await;
            self.publish().await;
        }
        report
    }

    async fn handle_report(&self, report: &TickReport) {
        self.session.metrics.record_scan_tick();
        let fired = self.session.dispatcher.dispatch(&report.alerts);
        self.session.metrics.record_alerts(fired);
        *self.session.recent_alerts.lock().await = report.alerts.clone();
    }

    /// One breadcrumb pass over the latest fix.
    pub async fn record_once(&self) -> bool {
        let recorded = self.session.trail.lock().await.record_current(Utc::now());
        if recorded {
            self.session.metrics.record_breadcrumb();
            self.publish().await;
        }
        recorded
    }

    /// Latest-wins location update from the feed.
    ///
    /// A malformed fix is logged and dropped; the feed's next fix replaces it.
    pub async fn ingest_fix(&self, fix: LocationFix) -> TrackingResult<()> {
        if let Err(err) = fix.validate() {
            self.session
                .logger
                .transient(&format!("dropping location fix: {}", err));
            return Err(err);
        }
        self.session.trail.lock().await.update_location(fix);
        self.publish().await;
        Ok(())
    }

    pub async fn toggle_ignore(&self, id: &str) -> TrackingResult<bool> {
        let result = self.session.roster.lock().await.toggle_ignore(id);
        self.finish(result).await
    }

    pub async fn remove_member(&self, id: &str) -> TrackingResult<String> {
        let result = self
            .session
            .roster
            .lock()
            .await
            .remove(id)
            .map(|member| member.id);
        self.finish(result).await
    }

    pub async fn set_highlight(&self, id: &str) -> TrackingResult<Option<String>> {
        let result = self.session.roster.lock().await.set_highlight(id);
        self.finish(result).await
    }

    /// Highlights the first member. Test mode only.
    pub async fn force_focus(&self) -> TrackingResult<Option<String>> {
        let result = match self.ensure_test_mode() {
            Ok(()) => self.session.roster.lock().await.force_focus(),
            Err(err) => Err(err),
        };
        self.finish(result).await
    }

    pub async fn ping(&self) -> TrackingResult<String> {
        let result = self.session.roster.lock().await.ping_highlighted();
        self.finish(result).await
    }

    pub async fn set_safe_distance(&self, meters: u32) -> TrackingResult<u32> {
        let result = self
            .session
            .roster
            .lock()
            .await
            .set_safe_distance(meters)
            .map(|_| meters);
        self.finish(result).await
    }

    pub async fn set_calibration_offset(&self, meters: i32) -> i32 {
        let applied = self
            .session
            .roster
            .lock()
            .await
            .set_calibration_offset(meters);
        self.publish().await;
        applied
    }

    pub async fn drop_pin(&self, kind: PoiKind) -> TrackingResult<Poi> {
        let result = self
            .session
            .trail
            .lock()
            .await
            .drop_pin_here(kind)
            .cloned();
        self.finish(result).await
    }

    pub async fn calibration(&self) -> CalibrationConfig {
        self.session.roster.lock().await.calibration()
    }

    /// Fires the test haptic pattern. Test mode only.
    pub async fn test_alert(&self) -> TrackingResult<()> {
        let result = self.ensure_test_mode().map(|()| {
            self.session.dispatcher.test();
            self.session.metrics.record_alerts(1);
        });
        self.finish(result).await
    }

    fn ensure_test_mode(&self) -> TrackingResult<()> {
        if self.is_test_mode() {
            Ok(())
        } else {
            Err(TrackingError::PreconditionNotMet("test mode is off".into()))
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.session.metrics.snapshot()
    }

    /// Runs `ticks` scan passes back to back on a virtual clock, recording a
    /// breadcrumb whenever a breadcrumb interval elapses. Scanning is gated
    /// like a live session.
    pub async fn run_offline(
        &self,
        ticks: usize,
        walk: &mut LocationWalk,
    ) -> TrackingResult<WorkflowResult> {
        self.session
            .capabilities
            .ensure_can_scan(self.is_test_mode())?;
        let scan_ms = self.session.config.scan_interval_ms.max(1);
        let crumb_ms = self.session.config.breadcrumb_interval_ms.max(1);
        let start = Utc::now();

        self.session.roster.lock().await.set_scanning(true);
        self.session.trail.lock().await.set_recording(true);

        let mut alerts = Vec::new();
        for tick in 1..=ticks {
            let elapsed_ms = tick as u64 * scan_ms;
            let now = start + ChronoDuration::milliseconds(elapsed_ms as i64);
            if self.session.capabilities.location {
                self.session.trail.lock().await.update_location(walk.next_fix());
            }

            let report = self.session.roster.lock().await.tick(now);
            self.handle_report(&report).await;
            alerts.extend(report.alerts);

            if elapsed_ms / crumb_ms > (elapsed_ms - scan_ms) / crumb_ms
                && self.session.trail.lock().await.record_current(now)
            {
                self.session.metrics.record_breadcrumb();
            }
        }

        self.session.roster.lock().await.set_scanning(false);
        self.session.trail.lock().await.set_recording(false);
        self.publish().await;

        let trail = self.session.trail.lock().await;
        Ok(WorkflowResult {
            ticks,
            alerts,
            summary: self.session.roster.lock().await.summary(),
            breadcrumbs: trail.breadcrumbs().len(),
            bounds: trail.bounds(),
        })
    }

    /// Builds the presentation model from the current session state.
    pub async fn snapshot(&self) -> VisualizationModel {
        let (roster, radar) = {
            let roster = self.session.roster.lock().await;
            let calibration = roster.calibration();
            (
                roster.snapshot(),
                radar_blips(
                    roster.members(),
                    roster.highlighted(),
                    calibration.safe_distance,
                ),
            )
        };
        let trail = self.session.trail.lock().await.snapshot();
        let connectivity = self
            .session
            .capabilities
            .connectivity(trail.current.is_some());

        VisualizationModel {
            connectivity,
            connectivity_label: connectivity.label().to_string(),
            test_mode: self.is_test_mode(),
            roster,
            radar,
            trail,
            recent_alerts: self.session.recent_alerts.lock().await.clone(),
            metrics: self.session.metrics.snapshot(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<VisualizationModel> {
        self.session.snapshots.subscribe()
    }

    async fn publish(&self) {
        let model = self.snapshot().await;
        self.session.snapshots.send_replace(model);
    }

    async fn finish<T>(&self, result: TrackingResult<T>) -> TrackingResult<T> {
        match &result {
            Ok(_) => self.publish().await,
            Err(err) => {
                self.session.metrics.record_skipped();
                self.session.logger.skipped(err);
            }
        }
        result
    }

    /// Stops every periodic task; nothing fires after this returns.
    pub async fn shutdown(&self) {
        for slot in [
            &self.session.scan_task,
            &self.session.trail_task,
            &self.session.location_task,
        ] {
            if let Some(task) = slot.lock().await.take() {
                task.stop().await;
            }
        }
        self.session.roster.lock().await.set_scanning(false);
        self.session.trail.lock().await.set_recording(false);
    }

    fn upgrade(session: &Weak<Session>) -> Option<Runner> {
        session.upgrade().map(|session| Runner { session })
    }
}
