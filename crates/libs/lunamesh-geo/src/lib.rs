//! # lunamesh-geo
//!
//! Coordinates and the delivery radius gate for pigeon mail.
//!
//! A drone only accepts destinations within [`MAX_DELIVERY_RADIUS_KM`] of the
//! operator. When either end is unknown the check is indeterminate and does
//! not block submission.

pub mod coordinate;
pub mod distance;
pub mod reference;

pub use coordinate::{Coordinate, CoordinateError};
pub use distance::{
    admissibility, haversine_km, is_within_radius, Admissibility, EARTH_RADIUS_KM,
    MAX_DELIVERY_RADIUS_KM,
};
pub use reference::{ReferenceFix, ReferenceResolver, ReferenceSource, DEFAULT_REFERENCE};
