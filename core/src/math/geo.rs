use serde::{Deserialize, Serialize};

use crate::device_interface::{Breadcrumb, LocationFix};

/// Smallest span an axis may have before it is widened, in degrees (~50 m).
pub const MIN_SPAN_DEG: f64 = 0.0005;

/// Fraction of each span added on both sides of the viewport.
pub const PADDING_RATIO: f64 = 0.15;

/// Side length of the normalized projection plane.
pub const PROJECTION_EXTENT: f64 = 100.0;

/// Point on the normalized projection plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
}

/// Geographic rectangle used to normalize coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Viewport enclosing every breadcrumb plus the current location.
    ///
    /// Returns `None` when there is nothing to enclose. Axes narrower than
    /// [`MIN_SPAN_DEG`] are recentred to exactly that span, then both axes are
    /// padded by [`PADDING_RATIO`] of their span on each side.
    pub fn enclosing(breadcrumbs: &[Breadcrumb], current: Option<&LocationFix>) -> Option<Self> {
        let points = breadcrumbs
            .iter()
            .map(|crumb| (crumb.latitude, crumb.longitude))
            .chain(current.map(|fix| (fix.latitude, fix.longitude)));

        let mut bounds: Option<Bounds> = None;
        for (lat, lng) in points {
            let b = bounds.get_or_insert(Bounds {
                min_lat: lat,
                max_lat: lat,
                min_lng: lng,
                max_lng: lng,
            });
            b.min_lat = b.min_lat.min(lat);
            b.max_lat = b.max_lat.max(lat);
            b.min_lng = b.min_lng.min(lng);
            b.max_lng = b.max_lng.max(lng);
        }

        let mut b = bounds?;
        (b.min_lat, b.max_lat) = widen(b.min_lat, b.max_lat);
        (b.min_lng, b.max_lng) = widen(b.min_lng, b.max_lng);

        let lat_pad = (b.max_lat - b.min_lat) * PADDING_RATIO;
        let lng_pad = (b.max_lng - b.min_lng) * PADDING_RATIO;
        Some(Bounds {
            min_lat: b.min_lat - lat_pad,
            max_lat: b.max_lat + lat_pad,
            min_lng: b.min_lng - lng_pad,
            max_lng: b.max_lng + lng_pad,
        })
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lng_span(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    /// Maps a coordinate onto `[0, 100]²`, north up.
    pub fn project(&self, latitude: f64, longitude: f64) -> ProjectedPoint {
        let x = (longitude - self.min_lng) / guarded(self.lng_span()) * PROJECTION_EXTENT;
        let y = PROJECTION_EXTENT
            - (latitude - self.min_lat) / guarded(self.lat_span()) * PROJECTION_EXTENT;
        ProjectedPoint { x, y }
    }

    /// Inverse of [`Bounds::project`]; returns `(latitude, longitude)`.
    pub fn unproject(&self, point: ProjectedPoint) -> (f64, f64) {
        let longitude = self.min_lng + point.x / PROJECTION_EXTENT * guarded(self.lng_span());
        let latitude =
            self.min_lat + (PROJECTION_EXTENT - point.y) / PROJECTION_EXTENT * guarded(self.lat_span());
        (latitude, longitude)
    }
}

fn widen(min: f64, max: f64) -> (f64, f64) {
    if max - min < MIN_SPAN_DEG {
        let center = (max + min) / 2.0;
        (center - MIN_SPAN_DEG / 2.0, center + MIN_SPAN_DEG / 2.0)
    } else {
        (min, max)
    }
}

fn guarded(span: f64) -> f64 {
    if span == 0.0 {
        1.0
    } else {
        span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn crumb(latitude: f64, longitude: f64) -> Breadcrumb {
        Breadcrumb {
            latitude,
            longitude,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_input_has_no_bounds() {
        assert!(Bounds::enclosing(&[], None).is_none());
    }

    #[test]
    fn single_point_gets_minimum_span_and_interior_projection() {
        let bounds = Bounds::enclosing(&[crumb(10.0, 20.0)], None).unwrap();
        assert!(bounds.lat_span() >= MIN_SPAN_DEG * 1.15);
        assert!(bounds.lng_span() >= MIN_SPAN_DEG * 1.15);

        let point = bounds.project(10.0, 20.0);
        assert!(point.y > 0.0 && point.y < 100.0);
        assert!(point.x > 0.0 && point.x < 100.0);
        assert!((point.x - 50.0).abs() < 1e-6);
        assert!((point.y - 50.0).abs() < 1e-6);
    }

    #[test]
    fn current_location_extends_bounds() {
        let fix = LocationFix::new(10.01, 20.02);
        let bounds = Bounds::enclosing(&[crumb(10.0, 20.0)], Some(&fix)).unwrap();
        assert!(bounds.max_lat > 10.01);
        assert!(bounds.max_lng > 20.02);
        assert!((bounds.lat_span() - 0.01 * 1.3).abs() < 1e-9);

        let only_fix = Bounds::enclosing(&[], Some(&fix)).unwrap();
        assert!(only_fix.min_lat < 10.01 && only_fix.max_lat > 10.01);
    }

    #[test]
    fn wide_axis_is_padded_without_widening() {
        let bounds = Bounds::enclosing(&[crumb(0.0, 0.0), crumb(0.01, 0.0)], None).unwrap();
        assert!((bounds.min_lat - (-0.0015)).abs() < 1e-12);
        assert!((bounds.max_lat - 0.0115).abs() < 1e-12);
        assert!((bounds.lng_span() - MIN_SPAN_DEG * 1.3).abs() < 1e-12);
    }

    #[test]
    fn higher_latitude_projects_higher_on_screen() {
        let bounds = Bounds::enclosing(&[crumb(0.0, 0.0), crumb(1.0, 1.0)], None).unwrap();
        let south = bounds.project(0.0, 0.5);
        let north = bounds.project(1.0, 0.5);
        assert!(north.y < south.y);
    }

    #[test]
    fn zero_span_is_guarded() {
        let flat = Bounds {
            min_lat: 5.0,
            max_lat: 5.0,
            min_lng: 7.0,
            max_lng: 7.0,
        };
        let point = flat.project(5.0, 7.0);
        assert_eq!(point, ProjectedPoint { x: 0.0, y: 100.0 });
    }

    #[test]
    fn unproject_recovers_coordinate() {
        let bounds =
            Bounds::enclosing(&[crumb(47.6, -122.33), crumb(47.61, -122.32)], None).unwrap();
        let (lat, lng) = bounds.unproject(bounds.project(47.605, -122.325));
        assert!((lat - 47.605).abs() < 1e-9);
        assert!((lng - -122.325).abs() < 1e-9);
    }
}
