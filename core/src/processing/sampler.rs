use chrono::{DateTime, Utc};
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::device_interface::member::{INITIAL_DISTANCE_M, INITIAL_RSSI_DBM};
use crate::device_interface::Member;
use crate::math::signal::{SignalModel, MIN_DISTANCE_M};
use crate::prelude::{MemberStatus, SampleUpdater};

/// Names handed out to simulated members.
pub const SIMULATED_NAMES: [&str; 6] = ["Alex", "Jordan", "Taylor", "Morgan", "Casey", "Riley"];

/// Parameters of the random-walk noise model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Width of the per-tick distance step, in meters.
    pub step_span: f64,
    /// Centre of the uniform draw; below 0.5 biases members outward.
    pub step_bias: f64,
    /// Chance per tick that battery drops by one percent.
    pub drain_probability: f64,
    pub min_start_battery: u8,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            step_span: 3.0,
            step_bias: 0.45,
            drain_probability: 0.2,
            min_start_battery: 40,
        }
    }
}

/// Random-walk sample updater used when no ranging hardware is present.
pub struct DriftSampler<R> {
    rng: R,
    config: DriftConfig,
}

impl<R: Rng> DriftSampler<R> {
    pub fn new(rng: R) -> Self {
        Self::with_config(rng, DriftConfig::default())
    }

    pub fn with_config(rng: R, config: DriftConfig) -> Self {
        Self { rng, config }
    }

    /// Builds a simulated member with a pooled name and a partly drained battery.
    pub fn spawn_member(&mut self, id: impl Into<String>, now: DateTime<Utc>) -> Member {
        let name = SIMULATED_NAMES
            .choose(&mut self.rng)
            .copied()
            .unwrap_or("Member");
        let min_battery = self.config.min_start_battery.min(100);
        Member {
            id: id.into(),
            name: name.to_string(),
            rssi: INITIAL_RSSI_DBM,
            distance: INITIAL_DISTANCE_M,
            raw_distance: INITIAL_DISTANCE_M,
            last_seen: now,
            status: MemberStatus::Connected,
            battery: self.rng.gen_range(min_battery..=100),
            ignored: false,
        }
    }
}

impl<R: Rng> SampleUpdater for DriftSampler<R> {
    fn update(&mut self, member: &Member, now: DateTime<Utc>) -> Member {
        let step = (self.rng.gen::<f64>() - self.config.step_bias) * self.config.step_span;
        let raw_distance = SignalModel::quantize((member.raw_distance + step).max(MIN_DISTANCE_M));
        let drained = self.rng.gen_bool(self.config.drain_probability.clamp(0.0, 1.0));

        Member {
            rssi: SignalModel::rssi_at(raw_distance),
            raw_distance,
            battery: if drained {
                member.battery.saturating_sub(1)
            } else {
                member.battery
            },
            last_seen: now,
            ..member.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_interface::DeviceDescriptor;
    use rand::{rngs::StdRng, SeedableRng};

    fn paired() -> Member {
        let descriptor = DeviceDescriptor::new("dev-42", None).unwrap();
        Member::from_descriptor(&descriptor, Utc::now())
    }

    #[test]
    fn walk_stays_bounded_and_floored() {
        let mut sampler = DriftSampler::new(StdRng::seed_from_u64(7));
        let mut member = paired();
        for _ in 0..500 {
            let next = sampler.update(&member, Utc::now());
            assert!(next.raw_distance >= MIN_DISTANCE_M);
            assert!((next.raw_distance - member.raw_distance).abs() <= 1.65 + 0.05);
            assert!(member.battery - next.battery <= 1);
            assert_eq!(next.rssi, SignalModel::rssi_at(next.raw_distance));
            member = next;
        }
    }

    #[test]
    fn update_leaves_status_and_ignore_alone() {
        let mut sampler = DriftSampler::new(StdRng::seed_from_u64(1));
        let mut member = paired();
        member.status = MemberStatus::Lost;
        member.ignored = true;
        let next = sampler.update(&member, Utc::now());
        assert_eq!(next.status, MemberStatus::Lost);
        assert!(next.ignored);
        assert_eq!(next.id, member.id);
    }

    #[test]
    fn battery_never_underflows() {
        let config = DriftConfig {
            drain_probability: 1.0,
            ..Default::default()
        };
        let mut sampler = DriftSampler::with_config(StdRng::seed_from_u64(3), config);
        let mut member = paired();
        member.battery = 1;
        member = sampler.update(&member, Utc::now());
        assert_eq!(member.battery, 0);
        member = sampler.update(&member, Utc::now());
        assert_eq!(member.battery, 0);
    }

    #[test]
    fn spawned_members_use_name_pool_and_battery_range() {
        let mut sampler = DriftSampler::new(StdRng::seed_from_u64(11));
        for index in 0..50 {
            let member = sampler.spawn_member(format!("sim-{index}"), Utc::now());
            assert!(SIMULATED_NAMES.contains(&member.name.as_str()));
            assert!((40..=100).contains(&member.battery));
            assert_eq!(member.distance, 2.0);
            assert_eq!(member.status, MemberStatus::Connected);
        }
    }
}
