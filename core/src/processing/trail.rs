use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device_interface::{Breadcrumb, LocationFix, Poi, PoiKind};
use crate::math::geo::{Bounds, ProjectedPoint};
use crate::prelude::{TrackingError, TrackingResult};
use crate::telemetry::log::LogManager;

/// Movement below this, in degrees on both axes, is treated as standing still.
pub const DEDUP_THRESHOLD_DEG: f64 = 0.00001;

/// POI placed on the projection plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectedPoi {
    pub poi: Poi,
    pub point: ProjectedPoint,
}

/// Everything the trail view needs, already projected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrailSnapshot {
    pub recording: bool,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub pois: Vec<Poi>,
    pub current: Option<LocationFix>,
    pub bounds: Option<Bounds>,
    pub path: Vec<ProjectedPoint>,
    pub markers: Vec<ProjectedPoi>,
    pub position: Option<ProjectedPoint>,
}

/// Owns the breadcrumb trail and the dropped pins.
pub struct TrailProjector {
    breadcrumbs: Vec<Breadcrumb>,
    pois: Vec<Poi>,
    current: Option<LocationFix>,
    recording: bool,
    logger: LogManager,
}

impl TrailProjector {
    pub fn new() -> Self {
        Self {
            breadcrumbs: Vec::new(),
            pois: Vec::new(),
            current: None,
            recording: false,
            logger: LogManager::new("trail"),
        }
    }

    /// Latest-wins update from the location feed.
    pub fn update_location(&mut self, fix: LocationFix) {
        self.current = Some(fix);
    }

    pub fn current_location(&self) -> Option<&LocationFix> {
        self.current.as_ref()
    }

    pub fn set_recording(&mut self, recording: bool) {
        if self.recording != recording {
            self.logger.record(if recording {
                "trail recording started"
            } else {
                "trail recording stopped"
            });
        }
        self.recording = recording;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Appends `fix` as a breadcrumb when recording and it has moved.
    ///
    /// Returns whether the trail grew.
    pub fn record_fix(&mut self, fix: &LocationFix, now: DateTime<Utc>) -> bool {
        if !self.recording {
            return false;
        }
        let moved = match self.breadcrumbs.last() {
            None => true,
            Some(last) => {
                (last.latitude - fix.latitude).abs() > DEDUP_THRESHOLD_DEG
                    || (last.longitude - fix.longitude).abs() > DEDUP_THRESHOLD_DEG
            }
        };
        if moved {
            self.breadcrumbs.push(Breadcrumb::from_fix(fix, now));
        }
        moved
    }

    /// Breadcrumb tick body: records the latest known fix, if any.
    pub fn record_current(&mut self, now: DateTime<Utc>) -> bool {
        match self.current {
            Some(fix) => self.record_fix(&fix, now),
            None => false,
        }
    }

    /// Drops a labelled pin at `location`.
    pub fn drop_pin(&mut self, kind: PoiKind, location: Option<&LocationFix>) -> TrackingResult<&Poi> {
        let fix = location.ok_or_else(|| {
            TrackingError::PreconditionNotMet("no location fix for pin".into())
        })?;
        let poi = Poi::at(kind, fix);
        self.logger.record(&format!(
            "pin {} at {:.5},{:.5}",
            poi.label, poi.latitude, poi.longitude
        ));
        self.pois.push(poi);
        Ok(&self.pois[self.pois.len() - 1])
    }

    /// Drops a pin at the latest known location.
    pub fn drop_pin_here(&mut self, kind: PoiKind) -> TrackingResult<&Poi> {
        let current = self.current;
        self.drop_pin(kind, current.as_ref())
    }

    pub fn breadcrumbs(&self) -> &[Breadcrumb] {
        &self.breadcrumbs
    }

    pub fn pois(&self) -> &[Poi] {
        &self.pois
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::enclosing(&self.breadcrumbs, self.current.as_ref())
    }

    pub fn snapshot(&self) -> TrailSnapshot {
        let bounds = self.bounds();
        let (path, markers, position) = match &bounds {
            Some(b) => (
                self.breadcrumbs
                    .iter()
                    .map(|crumb| b.project(crumb.latitude, crumb.longitude))
                    .collect(),
                self.pois
                    .iter()
                    .map(|poi| ProjectedPoi {
                        poi: poi.clone(),
                        point: b.project(poi.latitude, poi.longitude),
                    })
                    .collect(),
                self.current.map(|fix| b.project(fix.latitude, fix.longitude)),
            ),
            None => (Vec::new(), Vec::new(), None),
        };

        TrailSnapshot {
            recording: self.recording,
            breadcrumbs: self.breadcrumbs.clone(),
            pois: self.pois.clone(),
            current: self.current,
            bounds,
            path,
            markers,
            position,
        }
    }
}

impl Default for TrailProjector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording() -> TrailProjector {
        let mut trail = TrailProjector::new();
        trail.set_recording(true);
        trail
    }

    #[test]
    fn first_fix_is_always_recorded() {
        let mut trail = recording();
        assert!(trail.record_fix(&LocationFix::new(10.0, 20.0), Utc::now()));
        assert_eq!(trail.breadcrumbs().len(), 1);
    }

    #[test]
    fn stationary_noise_is_deduplicated() {
        let mut trail = recording();
        trail.record_fix(&LocationFix::new(10.0, 20.0), Utc::now());
        for jitter in [0.0, 0.000005, -0.000009, 0.0000099] {
            let fix = LocationFix::new(10.0 + jitter, 20.0 - jitter);
            assert!(!trail.record_fix(&fix, Utc::now()));
        }
        assert_eq!(trail.breadcrumbs().len(), 1);
    }

    #[test]
    fn movement_on_one_axis_is_enough() {
        let mut trail = recording();
        trail.record_fix(&LocationFix::new(10.0, 20.0), Utc::now());
        assert!(trail.record_fix(&LocationFix::new(10.0, 20.00002), Utc::now()));
        assert!(trail.record_fix(&LocationFix::new(10.00002, 20.00002), Utc::now()));
        assert_eq!(trail.breadcrumbs().len(), 3);
    }

    #[test]
    fn fixes_are_dropped_when_not_recording() {
        let mut trail = TrailProjector::new();
        trail.update_location(LocationFix::new(1.0, 1.0));
        assert!(!trail.record_current(Utc::now()));
        trail.set_recording(true);
        assert!(trail.record_current(Utc::now()));
        trail.set_recording(false);
        trail.update_location(LocationFix::new(2.0, 2.0));
        assert!(!trail.record_current(Utc::now()));
        assert_eq!(trail.breadcrumbs().len(), 1);
    }

    #[test]
    fn record_current_without_fix_is_noop() {
        let mut trail = recording();
        assert!(!trail.record_current(Utc::now()));
        assert!(trail.breadcrumbs().is_empty());
    }

    #[test]
    fn danger_pin_is_labelled() {
        let mut trail = TrailProjector::new();
        let fix = LocationFix::new(1.0, 2.0);
        let poi = trail.drop_pin(PoiKind::Danger, Some(&fix)).unwrap();
        assert_eq!(poi.label, "Danger");
        assert_eq!(poi.kind, PoiKind::Danger);
        assert_eq!((poi.latitude, poi.longitude), (1.0, 2.0));
    }

    #[test]
    fn pin_without_location_is_rejected() {
        let mut trail = TrailProjector::new();
        assert!(matches!(
            trail.drop_pin_here(PoiKind::Camp),
            Err(TrackingError::PreconditionNotMet(_))
        ));
        assert!(trail.pois().is_empty());

        trail.update_location(LocationFix::new(3.0, 4.0));
        let id = trail.drop_pin_here(PoiKind::Camp).unwrap().id;
        let other = trail.drop_pin_here(PoiKind::Camp).unwrap().id;
        assert_ne!(id, other);
    }

    #[test]
    fn snapshot_projects_everything_inside_viewport() {
        let mut trail = recording();
        trail.record_fix(&LocationFix::new(45.0, 7.0), Utc::now());
        trail.record_fix(&LocationFix::new(45.001, 7.002), Utc::now());
        trail.update_location(LocationFix::new(45.002, 7.001));
        trail.drop_pin_here(PoiKind::Water).unwrap();

        let snapshot = trail.snapshot();
        assert!(snapshot.bounds.is_some());
        assert_eq!(snapshot.path.len(), 2);
        assert_eq!(snapshot.markers.len(), 1);
        let inside = |p: &ProjectedPoint| p.x > 0.0 && p.x < 100.0 && p.y > 0.0 && p.y < 100.0;
        assert!(snapshot.path.iter().all(inside));
        assert!(snapshot.markers.iter().all(|m| inside(&m.point)));
        assert!(inside(&snapshot.position.unwrap()));
    }

    #[test]
    fn empty_trail_has_no_viewport() {
        let snapshot = TrailProjector::new().snapshot();
        assert!(snapshot.bounds.is_none());
        assert!(snapshot.path.is_empty());
    }
}
