//! Pigeon mail submission and delivery tracking.
//!
//! The operator console feeds a [`PigeonMailForm`] (or a plain chat draft)
//! into a [`Dispatcher`]. Validation and the radius gate run first; only
//! then is the envelope wrapped and handed to the [`MeshTransport`]. The
//! [`DeliveryTracker`] owns the per-message state that the console renders:
//!
//! ```text
//! Sending ──resolve(id)────────────▶ Acknowledged
//!    │
//!    ├──resolve(none)──────────────▶ Failed (missing id)
//!    ├──reject(err, maybe id)──────▶ Failed (rejected, id kept)
//!    └──settle timeout─────────────▶ Failed (timeout)
//! ```
//!
//! Failed sends are reported once and never retried here; resending is a
//! new submission with its own record.

pub mod chat;
pub mod dispatch;
pub mod error;
pub mod form;
pub mod loopback;
pub mod record;
pub mod tracker;
pub mod transport;

pub use chat::{ChatComposer, DEFAULT_CHAT_MAX_BYTES};
pub use dispatch::{Dispatcher, Submission};
pub use error::{SubmitError, ValidationError};
pub use form::{PigeonMailForm, MAX_CHANNEL};
pub use loopback::{LoopbackBehavior, LoopbackTransport, SentFrame};
pub use record::{
    ChatKey, ChatKind, DeliveryEvent, DeliveryRecord, DeliveryState, FailureCause, RecordId,
};
pub use tracker::{DeliveryTracker, Settlement, TrackerError};
pub use transport::{Destination, MeshTransport, MessageId, SendResult, TransportError};
