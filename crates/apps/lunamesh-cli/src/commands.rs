use std::sync::Arc;

use lunamesh_delivery::{
    ChatComposer, DeliveryRecord, DeliveryState, DeliveryTracker, Destination, Dispatcher,
    LoopbackBehavior, LoopbackTransport, PigeonMailForm, RecordId, SentFrame, Submission,
    SubmitError,
};
use lunamesh_geo::{admissibility, haversine_km, Admissibility, Coordinate, MAX_DELIVERY_RADIUS_KM};
use lunamesh_pigeon::{armor, ArmorError, DeliveryEnvelope, DroneDeliveryMessage, EnvelopeError};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Armor(#[from] ArmorError),

    #[error("input is neither a !BIN! envelope nor hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error("delivery tracker closed before the send settled")]
    TrackerClosed,

    #[error("failed to render output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Scripted outcome for the loopback transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Simulate {
    Ack,
    NoId,
    Reject,
    RejectWithId,
    Stall,
}

impl Simulate {
    pub fn behavior(self) -> LoopbackBehavior {
        match self {
            Self::Ack => LoopbackBehavior::Acknowledge,
            Self::NoId => LoopbackBehavior::NoMessageId,
            Self::Reject => {
                LoopbackBehavior::Reject { reason: "simulated rejection".into(), assign_id: false }
            }
            Self::RejectWithId => {
                LoopbackBehavior::Reject { reason: "simulated rejection".into(), assign_id: true }
            }
            Self::Stall => LoopbackBehavior::Stall,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EncodeReport {
    pub message: DroneDeliveryMessage,
    pub admissibility: Admissibility,
    pub bytes: usize,
    pub hex: String,
    pub wrapped: String,
}

pub fn encode(
    form: &PigeonMailForm,
    reference: Option<Coordinate>,
) -> Result<EncodeReport, CommandError> {
    let message = form.validate(reference).map_err(SubmitError::from)?;
    let bytes = message.encode()?;
    Ok(EncodeReport {
        admissibility: form.admissibility(reference),
        bytes: bytes.len(),
        hex: hex::encode(&bytes),
        wrapped: armor::wrap(&bytes),
        message,
    })
}

/// Decode a `!BIN!` wrapped envelope or a raw hex dump.
pub fn decode(input: &str) -> Result<DeliveryEnvelope, CommandError> {
    let input = input.trim();
    let bytes = if armor::is_binary_envelope(input) {
        armor::unwrap(input)?
    } else {
        log::debug!("[pigeon] decoding input as hex");
        hex::decode(input.replace(' ', ""))?
    };
    Ok(DeliveryEnvelope::decode(&bytes)?)
}

#[derive(Debug, Serialize)]
pub struct SendReport {
    pub submission: Submission,
    pub record: DeliveryRecord,
    pub frames: Vec<SentFrame>,
}

/// Loopback-backed dispatcher for dry runs.
pub fn loopback_dispatcher(
    simulate: Simulate,
    tracker: DeliveryTracker,
) -> (Arc<LoopbackTransport>, Dispatcher) {
    let transport = Arc::new(LoopbackTransport::new(simulate.behavior()));
    let dispatcher = Dispatcher::new(transport.clone(), tracker);
    (transport, dispatcher)
}

pub async fn send_pigeon_mail(
    simulate: Simulate,
    tracker: DeliveryTracker,
    form: &PigeonMailForm,
    reference: Option<Coordinate>,
) -> Result<SendReport, CommandError> {
    let (transport, dispatcher) = loopback_dispatcher(simulate, tracker);
    let mut events = dispatcher.tracker().subscribe();
    let submission = dispatcher.submit_pigeon_mail(form, reference)?;
    let record = wait_settled(dispatcher.tracker(), &mut events, submission.record_id).await?;
    Ok(SendReport { submission, record, frames: transport.sent() })
}

pub async fn send_chat(
    simulate: Simulate,
    tracker: DeliveryTracker,
    destination: Destination,
    channel: u8,
    max_bytes: usize,
    text: &str,
) -> Result<SendReport, CommandError> {
    let (transport, dispatcher) = loopback_dispatcher(simulate, tracker);
    let mut events = dispatcher.tracker().subscribe();
    let composer =
        ChatComposer::new(dispatcher.clone(), destination, channel).with_max_bytes(max_bytes);
    let submission = composer.send_text(text)?;
    let record = wait_settled(dispatcher.tracker(), &mut events, submission.record_id).await?;
    Ok(SendReport { submission, record, frames: transport.sent() })
}

async fn wait_settled(
    tracker: &DeliveryTracker,
    events: &mut tokio::sync::broadcast::Receiver<lunamesh_delivery::DeliveryEvent>,
    record_id: RecordId,
) -> Result<DeliveryRecord, CommandError> {
    loop {
        if let Some(record) = tracker.get(record_id).filter(|r| r.state.is_terminal()) {
            if record.state == DeliveryState::Failed {
                log::warn!(
                    "[pigeon] send {} failed message_id={:?} cause={:?}",
                    record.record_id,
                    record.message_id,
                    record.failure
                );
            }
            return Ok(record);
        }
        match events.recv().await {
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => return Err(CommandError::TrackerClosed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DistanceReport {
    pub from: Coordinate,
    pub to: Coordinate,
    pub distance_km: f64,
    pub admissibility: Admissibility,
}

pub fn distance(from: Coordinate, to: Coordinate) -> DistanceReport {
    DistanceReport {
        from,
        to,
        distance_km: haversine_km(from, to),
        admissibility: admissibility(Some(from), Some(to), MAX_DELIVERY_RADIUS_KM),
    }
}
