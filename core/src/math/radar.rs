use crate::math::geo::ProjectedPoint;

/// Radar range as a multiple of the safe distance.
pub const RADAR_RANGE_FACTOR: f64 = 1.5;

/// Outermost ring a blip may sit on, keeping it inside the 100x100 canvas.
const MAX_RADIUS: f64 = 48.0;

const CENTER: f64 = 50.0;

/// Position of the `index`-th of `count` blips on the radar canvas.
///
/// Blips are spread evenly by angle; radius scales with distance over
/// `safe_distance * RADAR_RANGE_FACTOR` and saturates at the outer ring.
pub fn radar_position(index: usize, count: usize, distance: f64, safe_distance: u32) -> ProjectedPoint {
    let angle = (index as f64 * (360.0 / count.max(1) as f64)).to_radians();
    let range = (safe_distance.max(1) as f64) * RADAR_RANGE_FACTOR;
    let radius = (distance / range * CENTER).min(MAX_RADIUS);
    ProjectedPoint {
        x: CENTER + radius * angle.cos(),
        y: CENTER + radius * angle.sin(),
    }
}
