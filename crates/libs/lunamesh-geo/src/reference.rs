//! Choosing the operator reference position for the radius gate.

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;

/// Fallback operator position (Tripoli) used when fallbacks are enabled and
/// nothing better is known.
pub const DEFAULT_REFERENCE: Coordinate = Coordinate::new(32.8872, 13.1913);

/// Shift applied to the device's own position so the operator marker does
/// not sit exactly on top of the node.
const DEVICE_OFFSET_LATITUDE: f64 = 0.0002;
const DEVICE_OFFSET_LONGITUDE: f64 = 0.0003;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceSource {
    /// A live geolocation fix.
    Live,
    /// The connected device's own node position, offset slightly.
    Device,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFix {
    pub coordinate: Coordinate,
    pub source: ReferenceSource,
}

/// Picks the reference coordinate from whatever positions are available.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceResolver {
    fallback: bool,
}

impl ReferenceResolver {
    /// Live fixes only.
    pub fn live_only() -> Self {
        Self { fallback: false }
    }

    /// Fall back to the device position, then to [`DEFAULT_REFERENCE`].
    pub fn with_fallback() -> Self {
        Self { fallback: true }
    }

    pub fn resolve(
        &self,
        live_fix: Option<Coordinate>,
        device_fix: Option<Coordinate>,
    ) -> Option<ReferenceFix> {
        if let Some(coordinate) = live_fix.filter(Coordinate::is_finite) {
            return Some(ReferenceFix { coordinate, source: ReferenceSource::Live });
        }
        if !self.fallback {
            return None;
        }
        if let Some(device) = device_fix.filter(Coordinate::is_finite) {
            let coordinate = device.offset(DEVICE_OFFSET_LATITUDE, DEVICE_OFFSET_LONGITUDE);
            log::info!(
                "reference position next to device: lat={} lon={}",
                coordinate.latitude,
                coordinate.longitude
            );
            return Some(ReferenceFix { coordinate, source: ReferenceSource::Device });
        }
        log::info!("reference position falling back to default location");
        Some(ReferenceFix { coordinate: DEFAULT_REFERENCE, source: ReferenceSource::Default })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_fix_wins() {
        let live = Coordinate::new(10.0, 20.0);
        let device = Coordinate::new(11.0, 21.0);
        let fix = ReferenceResolver::with_fallback().resolve(Some(live), Some(device));
        assert_eq!(fix, Some(ReferenceFix { coordinate: live, source: ReferenceSource::Live }));
    }

    #[test]
    fn live_only_returns_none_without_fix() {
        let device = Coordinate::new(11.0, 21.0);
        assert_eq!(ReferenceResolver::live_only().resolve(None, Some(device)), None);
    }

    #[test]
    fn device_fix_is_offset() {
        let device = Coordinate::from_fixed_point(328_872_000, 131_913_000);
        let fix = ReferenceResolver::with_fallback().resolve(None, Some(device)).expect("fix");
        assert_eq!(fix.source, ReferenceSource::Device);
        assert!((fix.coordinate.latitude - 32.8874).abs() < 1e-9);
        assert!((fix.coordinate.longitude - 13.1916).abs() < 1e-9);
    }

    #[test]
    fn default_location_last() {
        let fix = ReferenceResolver::with_fallback().resolve(None, None).expect("fix");
        assert_eq!(fix.source, ReferenceSource::Default);
        assert_eq!(fix.coordinate, DEFAULT_REFERENCE);
    }

    #[test]
    fn non_finite_live_fix_is_ignored() {
        let bogus = Coordinate::new(f64::NAN, 0.0);
        assert_eq!(ReferenceResolver::live_only().resolve(Some(bogus), None), None);
    }
}
