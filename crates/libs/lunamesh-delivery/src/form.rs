//! Pigeon mail request as entered by the operator.

use lunamesh_geo::{admissibility, Admissibility, Coordinate, MAX_DELIVERY_RADIUS_KM};
use lunamesh_pigeon::{
    altitude_to_wire, utf8_len, DeliveryEnvelope, DroneDeliveryMessage, NodeId, MAX_TEXT_BYTES,
};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_ALTITUDE_M: f64 = 30.0;
pub const DEFAULT_RECIPIENT: &str = "!433d78a8";
pub const DEFAULT_DRONE: &str = "!433d7cd8";
pub const DEFAULT_CHANNEL: i64 = 0;

const MAX_ALTITUDE_M: f64 = 120.0;
/// Highest mesh channel index.
pub const MAX_CHANNEL: u8 = 7;

/// Raw pigeon mail form values; nothing here is trusted until
/// [`PigeonMailForm::validate`] accepts it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PigeonMailForm {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Meters above ground.
    pub altitude: f64,
    pub text: String,
    pub recipient_node_id: String,
    pub drone_node_id: String,
    pub channel: i64,
}

impl Default for PigeonMailForm {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            altitude: DEFAULT_ALTITUDE_M,
            text: String::new(),
            recipient_node_id: DEFAULT_RECIPIENT.into(),
            drone_node_id: DEFAULT_DRONE.into(),
            channel: DEFAULT_CHANNEL,
        }
    }
}

impl PigeonMailForm {
    /// Set the destination picked on the map, keeping the other fields.
    pub fn set_destination(&mut self, destination: Coordinate) {
        self.latitude = Some(destination.latitude);
        self.longitude = Some(destination.longitude);
    }

    pub fn destination(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.latitude?, self.longitude?))
    }

    /// UTF-8 size of the text, for the `n/100 bytes` counter.
    pub fn text_byte_count(&self) -> usize {
        utf8_len(&self.text)
    }

    /// Radius gate for the current destination.
    pub fn admissibility(&self, reference: Option<Coordinate>) -> Admissibility {
        admissibility(reference, self.destination(), MAX_DELIVERY_RADIUS_KM)
    }

    /// Every problem with the form, in field order.
    pub fn field_errors(&self, reference: Option<Coordinate>) -> Vec<ValidationError> {
        match self.check(reference) {
            Ok(_) => Vec::new(),
            Err(errors) => errors,
        }
    }

    /// Validate and build the message to encode.
    ///
    /// An unknown reference position leaves the radius gate indeterminate,
    /// which does not block submission.
    pub fn validate(
        &self,
        reference: Option<Coordinate>,
    ) -> Result<DroneDeliveryMessage, ValidationError> {
        self.check(reference).map_err(|mut errors| errors.swap_remove(0))
    }

    fn check(
        &self,
        reference: Option<Coordinate>,
    ) -> Result<DroneDeliveryMessage, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let longitude = required(&mut errors, "longitude", self.longitude);
        if let Some(value) = longitude {
            in_range(&mut errors, "longitude", value, -180.0, 180.0);
        }
        let latitude = required(&mut errors, "latitude", self.latitude);
        if let Some(value) = latitude {
            in_range(&mut errors, "latitude", value, -90.0, 90.0);
        }
        in_range(&mut errors, "altitude", self.altitude, 0.0, MAX_ALTITUDE_M);

        let bytes = self.text_byte_count();
        if bytes > MAX_TEXT_BYTES {
            errors.push(ValidationError::TextTooLong { bytes, max: MAX_TEXT_BYTES });
        }

        let recipient = node_id(&mut errors, "recipient_node_id", &self.recipient_node_id);
        let drone = node_id(&mut errors, "drone_node_id", &self.drone_node_id);

        let channel = u8::try_from(self.channel).ok().filter(|c| *c <= MAX_CHANNEL);
        if channel.is_none() {
            errors.push(ValidationError::OutOfRange {
                field: "channel",
                value: self.channel as f64,
                min: 0.0,
                max: f64::from(MAX_CHANNEL),
            });
        }

        if let Admissibility::Beyond { distance_km } = self.admissibility(reference) {
            errors.push(ValidationError::TooFar { distance_km, radius_km: MAX_DELIVERY_RADIUS_KM });
        }

        match (longitude, latitude, recipient, drone, channel) {
            (Some(longitude), Some(latitude), Some(recipient), Some(drone), Some(channel))
                if errors.is_empty() =>
            {
                Ok(DroneDeliveryMessage {
                    envelope: DeliveryEnvelope {
                        recipient,
                        longitude,
                        latitude,
                        altitude: altitude_to_wire(self.altitude),
                        text: self.text.clone(),
                    },
                    drone,
                    channel,
                })
            }
            _ => Err(errors),
        }
    }
}

fn required(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: Option<f64>,
) -> Option<f64> {
    if value.is_none() {
        errors.push(ValidationError::MissingField { field });
    }
    value
}

fn in_range(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) {
    if !(min..=max).contains(&value) {
        errors.push(ValidationError::OutOfRange { field, value, min, max });
    }
}

fn node_id(errors: &mut Vec<ValidationError>, field: &'static str, raw: &str) -> Option<NodeId> {
    match raw.parse::<NodeId>() {
        Ok(node) => Some(node),
        Err(source) => {
            errors.push(ValidationError::InvalidNodeIdentifier { field, source });
            None
        }
    }
}
