/// Signal strength measured at one meter, in dBm.
pub const REFERENCE_RSSI_DBM: f64 = -50.0;

/// Log-distance path loss exponent for an obstructed outdoor link.
pub const PATH_LOSS_EXPONENT: f64 = 2.5;

/// Closest distance the estimator will report, in meters.
pub const MIN_DISTANCE_M: f64 = 0.5;

pub struct SignalModel;

impl SignalModel {
    /// RSSI expected at `distance_m` under the log-distance model.
    pub fn rssi_at(distance_m: f64) -> i32 {
        let distance = distance_m.max(MIN_DISTANCE_M);
        (REFERENCE_RSSI_DBM - 10.0 * PATH_LOSS_EXPONENT * distance.log10()).round() as i32
    }

    /// Rounds a distance to the 0.1 m resolution shown to users.
    pub fn quantize(distance_m: f64) -> f64 {
        (distance_m * 10.0).round() / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rssi_at_one_meter_is_reference() {
        assert_eq!(SignalModel::rssi_at(1.0), -50);
        assert_eq!(SignalModel::rssi_at(10.0), -75);
    }

    #[test]
    fn rssi_decreases_with_distance() {
        let mut previous = SignalModel::rssi_at(MIN_DISTANCE_M);
        for step in 1..100 {
            let current = SignalModel::rssi_at(MIN_DISTANCE_M + step as f64);
            assert!(current <= previous);
            previous = current;
        }
        assert!(SignalModel::rssi_at(40.0) < SignalModel::rssi_at(4.0));
    }

    #[test]
    fn quantize_keeps_one_decimal() {
        assert_eq!(SignalModel::quantize(3.26), 3.3);
        assert_eq!(SignalModel::quantize(0.46), 0.5);
    }
}
