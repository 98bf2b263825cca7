//! # lunamesh-pigeon
//!
//! Pigeon mail envelope format for drone delivery over mesh text channels.
//!
//! A pigeon mail is a short text plus the coordinates a relay drone should
//! fly it to. The receiving relay firmware expects a fixed big-endian layout,
//! so this crate is the byte-exact contract between the operator console and
//! the drone.
//!
//! ## Envelope
//!
//! ```text
//! [magic:1][recipient:4][lon:8][prec:1][lat:8][prec:1][alt:1][len:1][text:len]
//!   0xAA     u32 BE      f64 BE   7     f64 BE   7     u8     u8     UTF-8
//! ```
//!
//! Meshtastic text channels only carry strings, so the envelope travels as
//! `!BIN!` followed by its base64 encoding (see [`armor`]).
//!
//! ## Example
//!
//! ```rust
//! use lunamesh_pigeon::{armor, DeliveryEnvelope, NodeId};
//!
//! let envelope = DeliveryEnvelope {
//!     recipient: "!433d78a8".parse::<NodeId>().unwrap(),
//!     longitude: 13.19,
//!     latitude: 32.88,
//!     altitude: 30,
//!     text: "hi".into(),
//! };
//! let bytes = envelope.encode().unwrap();
//! assert_eq!(bytes.len(), 27);
//!
//! let text = armor::wrap(&bytes);
//! let decoded = DeliveryEnvelope::decode(&armor::unwrap(&text).unwrap()).unwrap();
//! assert_eq!(decoded, envelope);
//! ```

pub mod armor;
pub mod envelope;
pub mod node_id;

pub use armor::{ArmorError, InboundText};
pub use envelope::{
    altitude_to_wire, utf8_len, DeliveryEnvelope, DroneDeliveryMessage, EnvelopeError,
};
pub use node_id::{NodeId, NodeIdError};

/// First byte of every pigeon mail envelope (`0b1010_1010`).
pub const MAGIC: u8 = 0xAA;

/// Decimal places advertised for both coordinates.
pub const COORDINATE_PRECISION: u8 = 7;

/// Maximum text section size in bytes.
pub const MAX_TEXT_BYTES: usize = 100;
