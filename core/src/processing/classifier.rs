use serde::{Deserialize, Serialize};

use crate::math::signal::MIN_DISTANCE_M;
use crate::prelude::{CalibrationConfig, MemberStatus, LOW_BATTERY_PERCENT};

/// Fraction of the safe distance past which a member is in the warning band.
pub const WARNING_RATIO: f64 = 0.7;

/// Calibrated distance together with the status it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub adjusted_distance: f64,
    pub status: MemberStatus,
}

/// Maps distances onto proximity states. Holds no memory of earlier ticks.
pub struct ProximityClassifier;

impl ProximityClassifier {
    /// Classifies an already-calibrated distance against `safe_distance`.
    ///
    /// Thresholds are strict, so a distance exactly on a boundary lands in
    /// the less severe bucket.
    pub fn classify(distance: f64, safe_distance: f64) -> MemberStatus {
        let distance = distance.max(MIN_DISTANCE_M);
        if distance > safe_distance {
            MemberStatus::Lost
        } else if distance > safe_distance * WARNING_RATIO {
            MemberStatus::Warning
        } else {
            MemberStatus::Connected
        }
    }

    /// Applies the calibration offset to a raw estimate and classifies it.
    pub fn calibrate(raw_distance: f64, config: &CalibrationConfig) -> Classification {
        let adjusted_distance =
            (raw_distance + config.calibration_offset as f64).max(MIN_DISTANCE_M);
        Classification {
            adjusted_distance,
            status: Self::classify(adjusted_distance, config.safe_distance as f64),
        }
    }

    /// True when a member has just left the safe zone.
    pub fn entered_lost(previous: MemberStatus, next: MemberStatus) -> bool {
        next == MemberStatus::Lost && previous != MemberStatus::Lost
    }

    /// True when battery has just dropped to or below the low threshold.
    pub fn battery_crossed_low(previous: u8, next: u8) -> bool {
        previous > LOW_BATTERY_PERCENT && next <= LOW_BATTERY_PERCENT
    }
}
