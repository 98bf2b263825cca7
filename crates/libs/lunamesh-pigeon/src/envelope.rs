//! Pigeon mail envelope encode/decode.
//!
//! This module must produce byte-identical output to what the relay
//! firmware parses; every offset below is part of that contract.

use serde::{Deserialize, Serialize};

use crate::node_id::NodeId;
use crate::{COORDINATE_PRECISION, MAGIC, MAX_TEXT_BYTES};

/// Envelope header size: 1 (magic) + 4 (recipient) + 9 (lon) + 9 (lat) + 1 (alt) + 1 (len) = 25
pub const HEADER_SIZE: usize = 25;

const RECIPIENT_OFFSET: usize = 1;
const LONGITUDE_OFFSET: usize = 5;
const LONGITUDE_PRECISION_OFFSET: usize = 13;
const LATITUDE_OFFSET: usize = 14;
const LATITUDE_PRECISION_OFFSET: usize = 22;
const ALTITUDE_OFFSET: usize = 23;
const TEXT_LEN_OFFSET: usize = 24;

/// Errors from envelope operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("malformed payload: {0} bytes (minimum {HEADER_SIZE})")]
    TooShort(usize),

    #[error("malformed payload: bad magic prefix 0x{0:02x} (expected 0xaa)")]
    BadMagic(u8),

    #[error("malformed payload: declared text length {declared} but {actual} bytes remain")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("malformed payload: text section is not valid UTF-8")]
    InvalidText,

    #[error("text is {0} bytes (maximum {MAX_TEXT_BYTES})")]
    TextTooLong(usize),
}

impl EnvelopeError {
    /// Returns `true` for errors that describe a malformed received envelope.
    pub fn is_malformed_payload(&self) -> bool {
        !matches!(self, Self::TextTooLong(_))
    }
}

/// Byte length of `text` once UTF-8 encoded.
pub fn utf8_len(text: &str) -> usize {
    text.len()
}

/// Round an altitude in meters and clamp it into the single wire byte.
pub fn altitude_to_wire(meters: f64) -> u8 {
    // NaN saturates to 0 in the cast
    meters.round().clamp(0.0, 255.0) as u8
}

/// The fields carried inside a pigeon mail envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryEnvelope {
    /// Node that should receive the text once the drone lands.
    pub recipient: NodeId,
    pub longitude: f64,
    pub latitude: f64,
    /// Cruise altitude in meters.
    pub altitude: u8,
    pub text: String,
}

impl DeliveryEnvelope {
    /// Encoded size for this envelope.
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.text.len()
    }

    /// Encode to wire format bytes.
    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        let text = self.text.as_bytes();
        if text.len() > MAX_TEXT_BYTES {
            return Err(EnvelopeError::TextTooLong(text.len()));
        }

        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.push(MAGIC);
        buf.extend_from_slice(&self.recipient.as_u32().to_be_bytes());
        buf.extend_from_slice(&self.longitude.to_be_bytes());
        buf.push(COORDINATE_PRECISION);
        buf.extend_from_slice(&self.latitude.to_be_bytes());
        buf.push(COORDINATE_PRECISION);
        buf.push(self.altitude);
        buf.push(text.len() as u8);
        buf.extend_from_slice(text);

        log::debug!(
            "pigeon envelope recipient={} lon={} lat={} alt={} text_len={} raw={}",
            self.recipient,
            self.longitude,
            self.latitude,
            self.altitude,
            text.len(),
            hex::encode(&buf)
        );
        Ok(buf)
    }

    /// Decode from wire format bytes.
    pub fn decode(data: &[u8]) -> Result<Self, EnvelopeError> {
        if data.len() < HEADER_SIZE {
            return Err(EnvelopeError::TooShort(data.len()));
        }

        if data[0] != MAGIC {
            return Err(EnvelopeError::BadMagic(data[0]));
        }

        let declared = data[TEXT_LEN_OFFSET] as usize;
        let actual = data.len() - HEADER_SIZE;
        if declared != actual {
            return Err(EnvelopeError::LengthMismatch { declared, actual });
        }

        let recipient = u32::from_be_bytes(read_array(data, RECIPIENT_OFFSET));
        let longitude = f64::from_be_bytes(read_array(data, LONGITUDE_OFFSET));
        let latitude = f64::from_be_bytes(read_array(data, LATITUDE_OFFSET));

        let precisions = (data[LONGITUDE_PRECISION_OFFSET], data[LATITUDE_PRECISION_OFFSET]);
        if precisions != (COORDINATE_PRECISION, COORDINATE_PRECISION) {
            log::debug!("pigeon envelope carries unusual precision bytes {precisions:?}");
        }

        let text = std::str::from_utf8(&data[HEADER_SIZE..])
            .map_err(|_| EnvelopeError::InvalidText)?
            .to_owned();

        Ok(Self {
            recipient: NodeId(recipient),
            longitude,
            latitude,
            altitude: data[ALTITUDE_OFFSET],
            text,
        })
    }
}

fn read_array<const N: usize>(data: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&data[offset..offset + N]);
    out
}

/// A complete drone delivery request: the envelope plus the routing data
/// the transport needs to hand it to the relay drone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneDeliveryMessage {
    pub envelope: DeliveryEnvelope,
    /// Relay node the envelope is sent to.
    pub drone: NodeId,
    /// Mesh channel index, 0..=7.
    pub channel: u8,
}

impl DroneDeliveryMessage {
    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        self.envelope.encode()
    }
}
