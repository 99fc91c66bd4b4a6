use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::prelude::{TrackingError, TrackingResult};

/// Position fix pushed by the location feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: 0.0,
            altitude: None,
        }
    }

    /// Rejects fixes a feed should never have produced.
    pub fn validate(&self) -> TrackingResult<()> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lng_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if lat_ok && lng_ok {
            Ok(())
        } else {
            Err(TrackingError::TransientUpstreamFailure(format!(
                "fix out of range: {}, {}",
                self.latitude, self.longitude
            )))
        }
    }
}

/// Recorded trail waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl Breadcrumb {
    pub fn from_fix(fix: &LocationFix, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoiKind {
    Camp,
    Water,
    Danger,
    Generic,
}

impl PoiKind {
    pub fn label(self) -> &'static str {
        match self {
            PoiKind::Camp => "Camp",
            PoiKind::Water => "Water",
            PoiKind::Danger => "Danger",
            PoiKind::Generic => "Mark",
        }
    }
}

/// Manually dropped map marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: PoiKind,
}

impl Poi {
    pub fn at(kind: PoiKind, fix: &LocationFix) -> Self {
        Self {
            id: Uuid::new_v4(),
            latitude: fix.latitude,
            longitude: fix.longitude,
            label: kind.label().to_string(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poi_serializes_kind_as_type() {
        let poi = Poi::at(PoiKind::Water, &LocationFix::new(1.0, 2.0));
        let json = serde_json::to_value(&poi).unwrap();
        assert_eq!(json["type"], "water");
        assert_eq!(json["label"], "Water");
    }

    #[test]
    fn out_of_range_fixes_are_rejected() {
        assert!(LocationFix::new(46.5, 7.9).validate().is_ok());
        assert!(LocationFix::new(91.0, 7.9).validate().is_err());
        assert!(LocationFix::new(46.5, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn generic_pin_is_labelled_mark() {
        assert_eq!(PoiKind::Generic.label(), "Mark");
        assert_eq!(PoiKind::Camp.label(), "Camp");
    }
}
