//! Station positions
//!
//! Station records carry a geodetic position; the Cartesian (ECEF) position
//! is derived once when the record is built and used for range checks.

use glam::DVec3;
use serde::{Deserialize, Serialize};

// WGS-84 ellipsoid parameters
const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
const WGS84_E2: f64 = 1.0 - (WGS84_B * WGS84_B) / (WGS84_A * WGS84_A);

/// Metres per foot
pub const FEET_TO_METRES: f64 = 0.3048;
/// Metres per nautical mile
pub const NM_TO_METRES: f64 = 1852.0;

/// Geodetic position in degrees and metres above the ellipsoid
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeodeticPosition {
    /// Latitude in degrees, north positive
    pub lat_deg: f64,
    /// Longitude in degrees, east positive
    pub lon_deg: f64,
    /// Elevation in metres
    pub elevation_m: f64,
}

impl GeodeticPosition {
    /// Create a position from degrees and an elevation in feet
    pub fn from_deg_ft(lat_deg: f64, lon_deg: f64, elevation_ft: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            elevation_m: elevation_ft * FEET_TO_METRES,
        }
    }

    /// Whether latitude and longitude lie on the globe
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat_deg) && (-180.0..=180.0).contains(&self.lon_deg)
    }

    /// Geodetic to ECEF XYZ in metres
    pub fn to_cartesian(&self) -> DVec3 {
        let (slat, clat) = self.lat_deg.to_radians().sin_cos();
        let (slon, clon) = self.lon_deg.to_radians().sin_cos();

        // Radius of curvature in the prime vertical
        let n = WGS84_A / (1.0 - WGS84_E2 * slat * slat).sqrt();

        DVec3::new(
            (n + self.elevation_m) * clat * clon,
            (n + self.elevation_m) * clat * slon,
            (n * (1.0 - WGS84_E2) + self.elevation_m) * slat,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equator_prime_meridian() {
        let p = GeodeticPosition::default().to_cartesian();
        assert!((p.x - WGS84_A).abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
        assert!(p.z.abs() < 1e-6);
    }

    #[test]
    fn test_north_pole() {
        let p = GeodeticPosition::from_deg_ft(90.0, 0.0, 0.0).to_cartesian();
        assert!((p.z - WGS84_B).abs() < 1e-3);
    }

    #[test]
    fn test_feet_conversion() {
        let p = GeodeticPosition::from_deg_ft(0.0, 0.0, 1000.0);
        assert!((p.elevation_m - 304.8).abs() < 1e-9);
    }

    #[test]
    fn test_validity() {
        assert!(GeodeticPosition::from_deg_ft(37.6, -122.4, 13.0).is_valid());
        assert!(!GeodeticPosition::from_deg_ft(91.0, 0.0, 0.0).is_valid());
        assert!(!GeodeticPosition::from_deg_ft(0.0, 200.0, 0.0).is_valid());
    }
}
