use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::prelude::{MemberStatus, TrackingError, TrackingResult};

/// Distance assigned to a freshly linked device, in meters.
pub const INITIAL_DISTANCE_M: f64 = 2.0;

/// Signal strength assigned to a freshly linked device, in dBm.
pub const INITIAL_RSSI_DBM: i32 = -50;

/// Identity reported by the pairing layer, validated before entering the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    id: String,
    name: Option<String>,
}

impl DeviceDescriptor {
    /// Rejects blank ids; blank names are treated as missing.
    pub fn new(id: impl Into<String>, name: Option<String>) -> TrackingResult<Self> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(TrackingError::InvalidInput("device id is empty".into()));
        }
        let name = name
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Ok(Self { id, name })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name shown for the device, falling back to `Device <last 4 id chars>`.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => {
                let chars: Vec<char> = self.id.chars().collect();
                let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
                format!("Device {}", tail)
            }
        }
    }
}

/// A tracked group participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub rssi: i32,
    /// Calibrated distance shown to the user.
    pub distance: f64,
    /// Uncalibrated estimate walked by the sample updater.
    pub raw_distance: f64,
    pub last_seen: DateTime<Utc>,
    pub status: MemberStatus,
    pub battery: u8,
    #[serde(default)]
    pub ignored: bool,
}

impl Member {
    /// Member created from a paired device.
    pub fn from_descriptor(descriptor: &DeviceDescriptor, now: DateTime<Utc>) -> Self {
        Self {
            id: descriptor.id().to_string(),
            name: descriptor.display_name(),
            rssi: INITIAL_RSSI_DBM,
            distance: INITIAL_DISTANCE_M,
            raw_distance: INITIAL_DISTANCE_M,
            last_seen: now,
            status: MemberStatus::Connected,
            battery: 100,
            ignored: false,
        }
    }

    pub fn is_tracked(&self) -> bool {
        !self.ignored
    }
}
