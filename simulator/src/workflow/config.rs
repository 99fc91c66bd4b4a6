use anyhow::Context;
use meshcore::device_interface::Capabilities;
use meshcore::processing::{BREADCRUMB_INTERVAL, SCAN_INTERVAL};
use meshcore::prelude::CALIBRATION_OFFSET_RANGE;
use meshcore::CalibrationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Device the host had already paired before the session started.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PairedDevice {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub safe_distance: u32,
    pub calibration_offset: i32,
    pub scan_interval_ms: u64,
    pub breadcrumb_interval_ms: u64,
    pub location_interval_ms: u64,
    pub simulated_members: usize,
    pub paired_devices: Vec<PairedDevice>,
    pub seed: u64,
    pub origin_latitude: f64,
    pub origin_longitude: f64,
    pub test_mode: bool,
    pub pairing_available: bool,
    pub location_available: bool,
    pub start_scanning: bool,
    pub start_recording: bool,
    pub bridge_port: u16,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            safe_distance: CalibrationConfig::default().safe_distance,
            calibration_offset: 0,
            scan_interval_ms: SCAN_INTERVAL.as_millis() as u64,
            breadcrumb_interval_ms: BREADCRUMB_INTERVAL.as_millis() as u64,
            location_interval_ms: 1_000,
            simulated_members: 3,
            paired_devices: Vec::new(),
            seed: 0,
            origin_latitude: 46.5592,
            origin_longitude: 7.9179,
            test_mode: true,
            pairing_available: false,
            location_available: true,
            start_scanning: false,
            start_recording: false,
            bridge_port: 9000,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn to_calibration(&self) -> CalibrationConfig {
        CalibrationConfig {
            safe_distance: self.safe_distance.max(1),
            calibration_offset: self.calibration_offset.clamp(
                *CALIBRATION_OFFSET_RANGE.start(),
                *CALIBRATION_OFFSET_RANGE.end(),
            ),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            pairing: self.pairing_available,
            location: self.location_available,
        }
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms.max(1))
    }

    pub fn breadcrumb_interval(&self) -> Duration {
        Duration::from_millis(self.breadcrumb_interval_ms.max(1))
    }

    pub fn location_interval(&self) -> Duration {
        Duration::from_millis(self.location_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_tracker_cadence() {
        let cfg = WorkflowConfig::default();
        assert_eq!(cfg.scan_interval(), Duration::from_secs(2));
        assert_eq!(cfg.breadcrumb_interval(), Duration::from_secs(5));
        assert_eq!(cfg.to_calibration(), CalibrationConfig::default());
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"safe_distance: 40\ncalibration_offset: -3\npaired_devices:\n  - id: AA:BB:01\n    name: Lead\n  - id: AA:BB:02\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.to_calibration().safe_distance, 40);
        assert_eq!(cfg.calibration_offset, -3);
        assert_eq!(cfg.paired_devices.len(), 2);
        assert_eq!(cfg.paired_devices[1].name, None);
        assert_eq!(cfg.scan_interval_ms, 2_000);

        let wild = WorkflowConfig {
            calibration_offset: -30,
            ..cfg
        };
        assert_eq!(wild.to_calibration().calibration_offset, -10);
    }

    #[test]
    fn config_load_reports_bad_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"safe_distance: [nope\n").unwrap();
        let path = temp.into_temp_path();
        let err = WorkflowConfig::load(&path).unwrap_err();
        assert!(format!("{err}").contains("parsing workflow config"));
    }
}
