//! Great-circle distance.
//!
//! Haversine over a spherical Earth with a fixed mean radius. Good to a few
//! meters at alarm-radius scale, which is well inside GPS accuracy anyway.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A pair of coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Haversine distance between two coordinates, in meters.
///
/// Symmetric, and exactly 0.0 for identical inputs. The caller guarantees
/// valid degree ranges; there are no error conditions.
pub fn distance_m(a: Coordinates, b: Coordinates) -> f64 {
    if a == b {
        return 0.0;
    }

    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}
