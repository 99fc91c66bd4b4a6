use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device_interface::Member;

/// Safe distance applied before the user adjusts anything.
pub const DEFAULT_SAFE_DISTANCE_M: u32 = 25;

/// Accepted calibration offset range, in meters.
pub const CALIBRATION_OFFSET_RANGE: std::ops::RangeInclusive<i32> = -10..=10;

/// Battery percentage at or below which a member counts as low.
pub const LOW_BATTERY_PERCENT: u8 = 20;

/// User-tunable thresholds applied by the classifier on every scan tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    pub safe_distance: u32,
    pub calibration_offset: i32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            safe_distance: DEFAULT_SAFE_DISTANCE_M,
            calibration_offset: 0,
        }
    }
}

/// Proximity state of a tracked member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Connected,
    Warning,
    Lost,
}

impl MemberStatus {
    /// Ordering used when comparing severities; higher is worse.
    pub fn severity(self) -> u8 {
        match self {
            MemberStatus::Connected => 0,
            MemberStatus::Warning => 1,
            MemberStatus::Lost => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MemberStatus::Connected => "connected",
            MemberStatus::Warning => "warning",
            MemberStatus::Lost => "lost",
        }
    }
}

/// Alert categories handed to the haptic sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Distance,
    Battery,
    Test,
}

/// Common error type for tracking operations.
///
/// None of these are fatal: callers log them and carry on with the next tick
/// or user action.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingError {
    #[error("precondition not met: {0}")]
    PreconditionNotMet(String),
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("transient upstream failure: {0}")]
    TransientUpstreamFailure(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type TrackingResult<T> = Result<T, TrackingError>;

/// Produces the next sample for a single member.
///
/// Implementations may carry their own randomness but must not touch the
/// member's status or ignored flag.
pub trait SampleUpdater {
    fn update(&mut self, member: &Member, now: DateTime<Utc>) -> Member;
}

/// Output side of the alert pipeline (vibration motor, log, test recorder).
pub trait HapticSink {
    fn vibrate(&self, pattern: &[u32]);
}

impl<T: HapticSink + ?Sized> HapticSink for Box<T> {
    fn vibrate(&self, pattern: &[u32]) {
        (**self).vibrate(pattern)
    }
}

impl<T: HapticSink + ?Sized> HapticSink for std::sync::Arc<T> {
    fn vibrate(&self, pattern: &[u32]) {
        (**self).vibrate(pattern)
    }
}
