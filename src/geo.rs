//! Geographic coordinate type and great-circle distance.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6_371.008_8;

/// A WGS-84 coordinate in decimal degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Haversine great-circle distance in kilometres.
    pub fn distance_km(self, other: GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }

    /// Linear interpolation in lat/lon space; `t = 0` is `self`, `t = 1` is `other`.
    pub fn lerp(self, other: GeoPoint, t: f64) -> GeoPoint {
        GeoPoint {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }

    /// Point offset by the given distances north and east, in kilometres.
    ///
    /// Uses the local flat-earth approximation, fine at city scale.
    pub fn offset_km(self, north_km: f64, east_km: f64) -> GeoPoint {
        let km_per_deg_lat = EARTH_RADIUS_KM.to_radians();
        let km_per_deg_lon = km_per_deg_lat * self.lat.to_radians().cos();
        GeoPoint {
            lat: self.lat + north_km / km_per_deg_lat,
            lon: self.lon + east_km / km_per_deg_lon,
        }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_to_self() {
        let p = GeoPoint::new(51.752, -1.2577);
        assert_eq!(p.distance_km(p), 0.0);
    }

    #[test]
    fn one_degree_of_latitude() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        assert!((a.distance_km(b) - 111.195).abs() < 0.01);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(51.7520, -1.2577);
        let b = GeoPoint::new(51.7560, -1.2540);
        assert!((a.distance_km(b) - b.distance_km(a)).abs() < 1e-12);
    }

    #[test]
    fn lerp_midpoint() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(2.0, 4.0);
        assert_eq!(a.lerp(b, 0.5), GeoPoint::new(1.0, 2.0));
        assert_eq!(a.lerp(b, 0.0), a);
    }

    #[test]
    fn offset_round_trips_distance() {
        let origin = GeoPoint::new(51.752, -1.2577);
        let north = origin.offset_km(1.5, 0.0);
        let east = origin.offset_km(0.0, 2.0);
        assert!((origin.distance_km(north) - 1.5).abs() < 1e-6);
        assert!((origin.distance_km(east) - 2.0).abs() < 1e-3);
    }
}
