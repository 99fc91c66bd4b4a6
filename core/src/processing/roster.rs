use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::device_interface::{DeviceDescriptor, Member};
use crate::prelude::{
    AlertKind, CalibrationConfig, MemberStatus, SampleUpdater, TrackingError, TrackingResult,
    CALIBRATION_OFFSET_RANGE, LOW_BATTERY_PERCENT,
};
use crate::processing::classifier::ProximityClassifier;
use crate::processing::sampler::DriftSampler;
use crate::telemetry::log::LogManager;

/// Alert raised by a scan tick for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertIntent {
    pub kind: AlertKind,
    pub member_id: String,
    pub member_name: String,
}

/// Outcome of one roster pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub updated: usize,
    pub alerts: Vec<AlertIntent>,
}

/// Counts over tracked (non-ignored) members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSummary {
    pub total: usize,
    pub tracked: usize,
    pub lost: usize,
    pub low_battery: usize,
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterSnapshot {
    /// Display order: the highlighted member first, the rest in insertion order.
    pub members: Vec<Member>,
    pub highlighted: Option<String>,
    pub calibration: CalibrationConfig,
    pub scanning: bool,
    pub summary: RosterSummary,
}

/// Owns the tracked members and the calibration applied to them.
pub struct RosterEngine<U> {
    members: Vec<Member>,
    calibration: CalibrationConfig,
    highlighted: Option<String>,
    scanning: bool,
    updater: U,
    logger: LogManager,
}

impl<U: SampleUpdater> RosterEngine<U> {
    pub fn new(updater: U) -> Self {
        Self::with_calibration(updater, CalibrationConfig::default())
    }

    pub fn with_calibration(updater: U, calibration: CalibrationConfig) -> Self {
        Self {
            members: Vec::new(),
            calibration,
            highlighted: None,
            scanning: false,
            updater,
            logger: LogManager::new("roster"),
        }
    }

    /// Links a paired device. Returns `false` when the id is already known.
    pub fn add_member(&mut self, descriptor: &DeviceDescriptor, now: DateTime<Utc>) -> bool {
        self.insert(Member::from_descriptor(descriptor, now))
    }

    fn insert(&mut self, member: Member) -> bool {
        if self.member(&member.id).is_some() {
            self.logger.skipped(&TrackingError::PreconditionNotMet(format!(
                "member {} already linked",
                member.id
            )));
            return false;
        }
        self.logger
            .record(&format!("linked {} ({})", member.name, member.id));
        self.members.push(member);
        true
    }

    /// Advances every tracked member by one sample and reclassifies it.
    ///
    /// Alerts compare each member against its own values from before this
    /// pass. Does nothing while scanning is off.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();
        if !self.scanning {
            return report;
        }

        let calibration = self.calibration;
        for member in self.members.iter_mut().filter(|m| !m.ignored) {
            let previous_status = member.status;
            let previous_battery = member.battery;

            let mut next = self.updater.update(member, now);
            let classification = ProximityClassifier::calibrate(next.raw_distance, &calibration);
            next.distance = classification.adjusted_distance;
            next.status = classification.status;

            if ProximityClassifier::entered_lost(previous_status, next.status) {
                report.alerts.push(AlertIntent {
                    kind: AlertKind::Distance,
                    member_id: next.id.clone(),
                    member_name: next.name.clone(),
                });
            }
            if ProximityClassifier::battery_crossed_low(previous_battery, next.battery) {
                report.alerts.push(AlertIntent {
                    kind: AlertKind::Battery,
                    member_id: next.id.clone(),
                    member_name: next.name.clone(),
                });
            }
            if next.status != previous_status {
                self.logger.record(&format!(
                    "{} {} -> {} at {:.1}m",
                    next.id,
                    previous_status.as_str(),
                    next.status.as_str(),
                    next.distance
                ));
            }

            *member = next;
            report.updated += 1;
        }
        report
    }

    pub fn set_scanning(&mut self, scanning: bool) {
        if self.scanning != scanning {
            self.logger
                .record(if scanning { "scan started" } else { "scan stopped" });
        }
        self.scanning = scanning;
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// Flips the ignored flag and returns the new value.
    pub fn toggle_ignore(&mut self, id: &str) -> TrackingResult<bool> {
        let member = self
            .members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| unknown_member(id))?;
        member.ignored = !member.ignored;
        Ok(member.ignored)
    }

    /// Removes a member, clearing the highlight if it pointed at it.
    pub fn remove(&mut self, id: &str) -> TrackingResult<Member> {
        let index = self
            .members
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| unknown_member(id))?;
        if self.highlighted.as_deref() == Some(id) {
            self.highlighted = None;
        }
        let removed = self.members.remove(index);
        self.logger.record(&format!("removed {}", removed.id));
        Ok(removed)
    }

    /// Toggles the highlight; returns the highlighted id afterwards.
    pub fn set_highlight(&mut self, id: &str) -> TrackingResult<Option<String>> {
        if self.highlighted.as_deref() == Some(id) {
            self.highlighted = None;
        } else {
            if self.member(id).is_none() {
                return Err(unknown_member(id));
            }
            self.highlighted = Some(id.to_string());
        }
        Ok(self.highlighted.clone())
    }

    /// Diagnostic shortcut that toggles the highlight on the first member.
    pub fn force_focus(&mut self) -> TrackingResult<Option<String>> {
        let first = self
            .members
            .first()
            .map(|m| m.id.clone())
            .ok_or_else(|| TrackingError::PreconditionNotMet("roster is empty".into()))?;
        self.set_highlight(&first)
    }

    /// Acknowledges a ping to the highlighted member; no state changes.
    pub fn ping_highlighted(&self) -> TrackingResult<String> {
        let member = self
            .highlighted_member()
            .ok_or_else(|| TrackingError::PreconditionNotMet("no member highlighted".into()))?;
        self.logger
            .record(&format!("ping sent to {} ({})", member.name, member.id));
        Ok(format!("Ping sent to {}'s device.", member.name))
    }

    pub fn set_safe_distance(&mut self, meters: u32) -> TrackingResult<()> {
        if meters == 0 {
            return Err(TrackingError::InvalidInput(
                "safe distance must be positive".into(),
            ));
        }
        self.calibration.safe_distance = meters;
        Ok(())
    }

    /// Stores the offset clamped to the calibration range and returns it.
    pub fn set_calibration_offset(&mut self, meters: i32) -> i32 {
        let clamped = meters.clamp(
            *CALIBRATION_OFFSET_RANGE.start(),
            *CALIBRATION_OFFSET_RANGE.end(),
        );
        self.calibration.calibration_offset = clamped;
        clamped
    }

    pub fn calibration(&self) -> CalibrationConfig {
        self.calibration
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.highlighted.as_deref()
    }

    pub fn highlighted_member(&self) -> Option<&Member> {
        self.highlighted.as_deref().and_then(|id| self.member(id))
    }

    /// Members with the highlighted one moved to the front.
    pub fn display_order(&self) -> Vec<&Member> {
        let highlighted = self.highlighted.as_deref();
        let mut ordered: Vec<&Member> = self.members.iter().collect();
        ordered.sort_by_key(|m| Some(m.id.as_str()) != highlighted);
        ordered
    }

    pub fn summary(&self) -> RosterSummary {
        let tracked = self.members.iter().filter(|m| m.is_tracked());
        let (mut count, mut lost, mut low_battery) = (0, 0, 0);
        for member in tracked {
            count += 1;
            if member.status == MemberStatus::Lost {
                lost += 1;
            }
            if member.battery <= LOW_BATTERY_PERCENT {
                low_battery += 1;
            }
        }
        RosterSummary {
            total: self.members.len(),
            tracked: count,
            lost,
            low_battery,
        }
    }

    pub fn snapshot(&self) -> RosterSnapshot {
        RosterSnapshot {
            members: self.display_order().into_iter().cloned().collect(),
            highlighted: self.highlighted.clone(),
            calibration: self.calibration,
            scanning: self.scanning,
            summary: self.summary(),
        }
    }
}

impl<R: Rng> RosterEngine<DriftSampler<R>> {
    /// Adds a member from the simulator's initial-generation path.
    pub fn add_simulated(&mut self, id: impl Into<String>, now: DateTime<Utc>) -> bool {
        let member = self.updater.spawn_member(id, now);
        self.insert(member)
    }
}

fn unknown_member(id: &str) -> TrackingError {
    TrackingError::PreconditionNotMet(format!("unknown member {}", id))
}
