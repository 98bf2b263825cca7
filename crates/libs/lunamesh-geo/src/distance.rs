//! Great-circle distance and the delivery radius gate.
//!
//! Pure functions; nothing here touches the transport.

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;

/// Mean earth radius in kilometers (IUGG), the value common web geodesy
/// libraries use for haversine distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Pigeon mail destinations must lie within this radius of the operator.
pub const MAX_DELIVERY_RADIUS_KM: f64 = 20.0;

/// Distances within a micrometre of the radius count as on the boundary.
const BOUNDARY_EPSILON_KM: f64 = 1e-9;

/// Haversine distance in kilometers.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let sin_dlat = (delta_lat / 2.0).sin();
    let sin_dlon = (delta_lon / 2.0).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// `true` iff the great-circle distance is at most `radius_km` (inclusive).
pub fn is_within_radius(reference: Coordinate, destination: Coordinate, radius_km: f64) -> bool {
    haversine_km(reference, destination) <= radius_km + BOUNDARY_EPSILON_KM
}

/// Outcome of the delivery radius gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Admissibility {
    Within { distance_km: f64 },
    Beyond { distance_km: f64 },
    /// One end is unknown; the gate cannot decide yet.
    Indeterminate,
}

impl Admissibility {
    /// Unknown positions do not block submission; only a known excess does.
    pub fn permits_submission(&self) -> bool {
        !matches!(self, Self::Beyond { .. })
    }

    pub fn distance_km(&self) -> Option<f64> {
        match self {
            Self::Within { distance_km } | Self::Beyond { distance_km } => Some(*distance_km),
            Self::Indeterminate => None,
        }
    }
}

/// Apply the radius gate when both ends may still be unknown.
pub fn admissibility(
    reference: Option<Coordinate>,
    destination: Option<Coordinate>,
    radius_km: f64,
) -> Admissibility {
    let (Some(reference), Some(destination)) = (reference, destination) else {
        log::debug!("radius gate indeterminate: reference or destination unknown");
        return Admissibility::Indeterminate;
    };
    let distance_km = haversine_km(reference, destination);
    if distance_km <= radius_km + BOUNDARY_EPSILON_KM {
        Admissibility::Within { distance_km }
    } else {
        Admissibility::Beyond { distance_km }
    }
}
