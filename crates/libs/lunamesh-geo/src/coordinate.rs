use serde::{Deserialize, Serialize};

/// Scale of the integer positions reported by mesh nodes (`latitude_i`).
const FIXED_POINT_SCALE: f64 = 1e7;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Build a coordinate, rejecting values outside the valid ranges.
    ///
    /// NaN fails both range checks.
    pub fn checked(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self { latitude, longitude })
    }

    /// Convert a node position given in 1e-7 degree integers.
    pub fn from_fixed_point(latitude_i: i32, longitude_i: i32) -> Self {
        Self {
            latitude: f64::from(latitude_i) / FIXED_POINT_SCALE,
            longitude: f64::from(longitude_i) / FIXED_POINT_SCALE,
        }
    }

    pub fn offset(self, d_latitude: f64, d_longitude: f64) -> Self {
        Self { latitude: self.latitude + d_latitude, longitude: self.longitude + d_longitude }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}
