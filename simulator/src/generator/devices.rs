use crate::workflow::config::PairedDevice;
use log::warn;
use meshcore::device_interface::DeviceDescriptor;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashSet;

/// Upper bound on the simulated roster; ids are drawn from a 16-bit space.
pub const MAX_SIMULATED_MEMBERS: usize = 256;

/// Hardware-style ids for simulated members, e.g. `SIM-4F2A`.
///
/// Requests above [`MAX_SIMULATED_MEMBERS`] are capped.
pub fn simulated_device_ids(count: usize, seed: u64) -> Vec<String> {
    let count = if count > MAX_SIMULATED_MEMBERS {
        warn!(
            "capping simulated members at {} (requested {})",
            MAX_SIMULATED_MEMBERS, count
        );
        MAX_SIMULATED_MEMBERS
    } else {
        count
    };

    let mut rng = StdRng::seed_from_u64(seed ^ 0x5eed);
    let mut seen = HashSet::with_capacity(count);
    let mut ids = Vec::with_capacity(count);
    while ids.len() < count {
        let raw: u16 = rng.gen();
        if seen.insert(raw) {
            ids.push(format!("SIM-{:04X}", raw));
        }
    }
    ids
}

/// Validates devices reported by the pairing layer, dropping malformed ones.
pub fn validated_descriptors(devices: &[PairedDevice]) -> Vec<DeviceDescriptor> {
    devices
        .iter()
        .filter_map(
            |device| match DeviceDescriptor::new(device.id.clone(), device.name.clone()) {
                Ok(descriptor) => Some(descriptor),
                Err(err) => {
                    warn!("skipping paired device {:?}: {}", device.id, err);
                    None
                }
            },
        )
        .collect()
}
