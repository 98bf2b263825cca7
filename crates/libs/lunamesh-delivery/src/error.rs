use lunamesh_pigeon::{EnvelopeError, NodeIdError};

use crate::tracker::TrackerError;

/// Input rejected before anything reaches the transport.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{field}: {source}")]
    InvalidNodeIdentifier {
        field: &'static str,
        #[source]
        source: NodeIdError,
    },

    #[error("{field} {value} outside [{min}, {max}]")]
    OutOfRange { field: &'static str, value: f64, min: f64, max: f64 },

    #[error("text message is {bytes} bytes (maximum {max})")]
    TextTooLong { bytes: usize, max: usize },

    #[error("destination is {distance_km:.3} km away (maximum {radius_km} km)")]
    TooFar { distance_km: f64, radius_km: f64 },
}

impl ValidationError {
    /// Form field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field }
            | Self::InvalidNodeIdentifier { field, .. }
            | Self::OutOfRange { field, .. } => field,
            Self::TextTooLong { .. } => "text",
            Self::TooFar { .. } => "destination",
        }
    }
}

/// Why a submission did not reach the transport.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum SubmitError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("envelope encoding failed: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("message is empty")]
    EmptyMessage,

    #[error("no device connected")]
    NotConnected,

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}
