//! Great-circle helpers. Every distance in the pipeline is in meters.

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Padding applied to the farthest member when sizing a cluster's footprint.
const BOUNDING_MARGIN: f64 = 1.2;

/// Footprint reported for an empty point set.
const EMPTY_BOUNDING_RADIUS_M: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoCoord {
    pub lat: f64,
    pub lng: f64,
}

impl GeoCoord {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Shift by raw degree offsets (north/east positive).
    pub fn offset(self, lat_offset: f64, lng_offset: f64) -> Self {
        Self::new(self.lat + lat_offset, self.lng + lng_offset)
    }

    /// Finite, with latitude in [-90, 90] and longitude in [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn distance_to(&self, other: &GeoCoord) -> f64 {
        haversine_meters(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Anything with a position.
pub trait Locatable {
    fn coord(&self) -> GeoCoord;
}

impl Locatable for GeoCoord {
    fn coord(&self) -> GeoCoord {
        *self
    }
}

/// Haversine great-circle distance in meters.
pub fn haversine_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let lat1_r = lat1.to_radians();
    let lat2_r = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1_r.cos() * lat2_r.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();
    EARTH_RADIUS_M * c
}

/// Kilometer form, for provider queries expressed in km.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    haversine_meters(lat1, lng1, lat2, lng2) / 1000.0
}

/// Arithmetic mean of the coordinates; `(0, 0)` for an empty slice.
pub fn centroid<T: Locatable>(items: &[T]) -> GeoCoord {
    if items.is_empty() {
        return GeoCoord::default();
    }
    let (lat, lng) = items.iter().fold((0.0, 0.0), |(lat, lng), item| {
        let c = item.coord();
        (lat + c.lat, lng + c.lng)
    });
    let n = items.len() as f64;
    GeoCoord::new(lat / n, lng / n)
}

/// Distance from `center` to the farthest item, padded by 20% and rounded up.
pub fn bounding_radius<T: Locatable>(center: GeoCoord, items: &[T]) -> f64 {
    if items.is_empty() {
        return EMPTY_BOUNDING_RADIUS_M;
    }
    let farthest = items
        .iter()
        .map(|item| center.distance_to(&item.coord()))
        .fold(0.0_f64, f64::max);
    (farthest * BOUNDING_MARGIN).ceil()
}

/// Initial compass bearing from `from` to `to`, degrees in `[0, 360)`.
pub fn initial_bearing(from: GeoCoord, to: GeoCoord) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let y = d_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();
    let bearing = y.atan2(x).to_degrees();
    (bearing + 360.0) % 360.0
}

/// Items within `radius_m` of `center`, input order preserved.
pub fn within_radius<T: Locatable>(center: GeoCoord, radius_m: f64, items: &[T]) -> Vec<&T> {
    items
        .iter()
        .filter(|item| center.distance_to(&item.coord()) <= radius_m)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINGSTON: GeoCoord = GeoCoord { lat: 18.0, lng: -76.8 };

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let other = GeoCoord::new(18.05, -76.85);
        let ab = KINGSTON.distance_to(&other);
        let ba = other.distance_to(&KINGSTON);
        assert!((ab - ba).abs() < 1e-9);
        assert_eq!(KINGSTON.distance_to(&KINGSTON), 0.0);
    }

    #[test]
    fn distance_matches_known_values() {
        // One degree of latitude is ~111.2 km.
        let d = haversine_meters(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_195.0).abs() < 50.0, "got {d}");

        let near = haversine_meters(18.0, -76.8, 18.0001, -76.8001);
        assert!(near > 10.0 && near < 20.0, "got {near}");

        assert!((haversine_km(0.0, 0.0, 1.0, 0.0) - d / 1000.0).abs() < 1e-9);
    }

    #[test]
    fn centroid_of_empty_is_origin() {
        let empty: Vec<GeoCoord> = vec![];
        assert_eq!(centroid(&empty), GeoCoord::new(0.0, 0.0));
    }

    #[test]
    fn centroid_is_mean() {
        let pts = [GeoCoord::new(10.0, 20.0), GeoCoord::new(20.0, 40.0)];
        assert_eq!(centroid(&pts), GeoCoord::new(15.0, 30.0));
    }

    #[test]
    fn bounding_radius_pads_farthest_point() {
        let far = GeoCoord::new(18.01, -76.8);
        let expected = (KINGSTON.distance_to(&far) * 1.2).ceil();
        assert_eq!(bounding_radius(KINGSTON, &[KINGSTON, far]), expected);

        let empty: Vec<GeoCoord> = vec![];
        assert_eq!(bounding_radius(KINGSTON, &empty), 100.0);
    }

    #[test]
    fn bearing_cardinal_directions() {
        let north = initial_bearing(GeoCoord::new(0.0, 0.0), GeoCoord::new(1.0, 0.0));
        let east = initial_bearing(GeoCoord::new(0.0, 0.0), GeoCoord::new(0.0, 1.0));
        let south = initial_bearing(GeoCoord::new(1.0, 0.0), GeoCoord::new(0.0, 0.0));
        let west = initial_bearing(GeoCoord::new(0.0, 1.0), GeoCoord::new(0.0, 0.0));
        assert!(north.abs() < 1e-9);
        assert!((east - 90.0).abs() < 1e-9);
        assert!((south - 180.0).abs() < 1e-9);
        assert!((west - 270.0).abs() < 1e-6);
    }

    #[test]
    fn within_radius_filters_in_meters() {
        let pts = [
            GeoCoord::new(18.0001, -76.8001),
            GeoCoord::new(18.05, -76.85),
        ];
        let hits = within_radius(KINGSTON, 5_000.0, &pts);
        assert_eq!(hits.len(), 1);
        assert_eq!(*hits[0], pts[0]);
        assert_eq!(within_radius(KINGSTON, 10_000.0, &pts).len(), 2);
    }

    #[test]
    fn offset_moves_north_east() {
        let moved = KINGSTON.offset(0.01, -0.02);
        assert!((moved.lat - 18.01).abs() < 1e-12);
        assert!((moved.lng + 76.82).abs() < 1e-12);
    }

    #[test]
    fn validity_covers_globe_bounds() {
        assert!(KINGSTON.is_valid());
        assert!(GeoCoord::new(90.0, -180.0).is_valid());
        assert!(!GeoCoord::new(89.5, 0.0).offset(0.8, 0.0).is_valid());
        assert!(!GeoCoord::new(0.0, 179.9).offset(0.0, 0.5).is_valid());
        assert!(!KINGSTON.offset(500.0, -400.0).is_valid());
        assert!(!GeoCoord::new(f64::NAN, 0.0).is_valid());
    }
}
