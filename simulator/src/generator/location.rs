use meshcore::device_interface::LocationFix;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::PI;

/// Roughly three meters of latitude, in degrees.
const STEP_DEG: f64 = 0.00003;

/// Chance per fix that the walker pauses in place.
const PAUSE_PROBABILITY: f64 = 0.25;

/// Simulated location feed: a hiker wandering away from an origin.
pub struct LocationWalk {
    rng: StdRng,
    latitude: f64,
    longitude: f64,
    heading: f64,
    altitude: f64,
}

impl LocationWalk {
    pub fn new(origin_latitude: f64, origin_longitude: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let heading = rng.gen_range(0.0..2.0 * PI);
        Self {
            rng,
            latitude: origin_latitude,
            longitude: origin_longitude,
            heading,
            altitude: 1_200.0,
        }
    }

    pub fn next_fix(&mut self) -> LocationFix {
        if !self.rng.gen_bool(PAUSE_PROBABILITY) {
            self.heading += self.rng.gen_range(-0.4..0.4);
            self.latitude += STEP_DEG * self.heading.cos();
            self.longitude += STEP_DEG * self.heading.sin();
            self.altitude += self.rng.gen_range(-0.5..0.5);
        }
        LocationFix {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy: self.rng.gen_range(3.0..12.0),
            altitude: Some(self.altitude),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_starts_at_origin_and_moves_in_small_steps() {
        let mut walk = LocationWalk::new(46.0, 8.0, 4);
        let mut previous = walk.next_fix();
        assert!((previous.latitude - 46.0).abs() <= STEP_DEG);
        for _ in 0..200 {
            let fix = walk.next_fix();
            assert!((fix.latitude - previous.latitude).abs() <= STEP_DEG + 1e-12);
            assert!((fix.longitude - previous.longitude).abs() <= STEP_DEG + 1e-12);
            assert!(fix.accuracy >= 3.0 && fix.accuracy < 12.0);
            previous = fix;
        }
    }

    #[test]
    fn same_seed_replays_same_track() {
        let mut a = LocationWalk::new(10.0, 20.0, 9);
        let mut b = LocationWalk::new(10.0, 20.0, 9);
        for _ in 0..20 {
            assert_eq!(a.next_fix(), b.next_fix());
        }
    }
}
