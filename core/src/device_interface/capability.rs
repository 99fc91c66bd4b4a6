use serde::{Deserialize, Serialize};

use crate::prelude::{TrackingError, TrackingResult};

/// Host capabilities detected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub pairing: bool,
    pub location: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityStatus {
    Online,
    Limited,
    #[default]
    Offline,
}

impl ConnectivityStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConnectivityStatus::Online => "Online",
            ConnectivityStatus::Limited => "Limited Connectivity",
            ConnectivityStatus::Offline => "Offline",
        }
    }
}

impl Capabilities {
    /// `has_fix` is whether the location feed has delivered anything yet.
    pub fn connectivity(&self, has_fix: bool) -> ConnectivityStatus {
        let located = self.location && has_fix;
        match (self.pairing, located) {
            (true, true) => ConnectivityStatus::Online,
            (true, false) | (false, true) => ConnectivityStatus::Limited,
            (false, false) => ConnectivityStatus::Offline,
        }
    }

    /// Scanning needs a pairing source unless the simulator stands in for it.
    pub fn ensure_can_scan(&self, test_mode: bool) -> TrackingResult<()> {
        if self.pairing || test_mode {
            Ok(())
        } else {
            Err(TrackingError::UpstreamUnavailable(
                "no pairing capability; enable test mode to simulate".into(),
            ))
        }
    }
}
