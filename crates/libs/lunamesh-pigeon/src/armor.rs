//! Text-safe encapsulation of binary envelopes.
//!
//! Meshtastic `sendText` only carries strings. Binary envelopes travel as
//! the literal marker `!BIN!` followed by standard padded base64, so a relay
//! can tell them apart from ordinary chat text.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::envelope::{DeliveryEnvelope, EnvelopeError};

/// Marker prepended to every wrapped envelope.
pub const BINARY_PREFIX: &str = "!BIN!";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArmorError {
    #[error("text is not a binary envelope (missing {BINARY_PREFIX} prefix)")]
    NotBinaryEnvelope,

    #[error("binary envelope body is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

/// Wrap raw envelope bytes for a text transport.
pub fn wrap(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(BINARY_PREFIX.len() + bytes.len().div_ceil(3) * 4);
    out.push_str(BINARY_PREFIX);
    STANDARD.encode_string(bytes, &mut out);
    out
}

/// Recover the raw bytes from a wrapped envelope.
pub fn unwrap(text: &str) -> Result<Vec<u8>, ArmorError> {
    let body = text.strip_prefix(BINARY_PREFIX).ok_or(ArmorError::NotBinaryEnvelope)?;
    Ok(STANDARD.decode(body)?)
}

pub fn is_binary_envelope(text: &str) -> bool {
    text.starts_with(BINARY_PREFIX)
}

/// Receiver-side view of an incoming text message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundText {
    Envelope(DeliveryEnvelope),
    Chat(String),
}

impl InboundText {
    /// Split incoming text into pigeon mail and plain chat.
    ///
    /// Text carrying the marker must decode completely; a corrupt envelope
    /// is an error rather than chat.
    pub fn classify(text: &str) -> Result<Self, ArmorError> {
        if !is_binary_envelope(text) {
            return Ok(Self::Chat(text.to_owned()));
        }
        let bytes = unwrap(text)?;
        Ok(Self::Envelope(DeliveryEnvelope::decode(&bytes)?))
    }
}
