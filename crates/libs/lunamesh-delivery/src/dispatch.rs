//! Hands validated messages to the transport and registers them with the
//! tracker.

use std::sync::Arc;

use lunamesh_geo::Coordinate;
use lunamesh_pigeon::armor;
use serde::Serialize;

use crate::error::SubmitError;
use crate::form::PigeonMailForm;
use crate::record::{ChatKey, RecordId};
use crate::tracker::DeliveryTracker;
use crate::transport::{Destination, MeshTransport};

/// A send that reached the transport and is now tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub record_id: RecordId,
    pub chat: ChatKey,
    /// Exact text handed to the transport.
    pub text: String,
}

#[derive(Clone)]
pub struct Dispatcher {
    transport: Option<Arc<dyn MeshTransport>>,
    tracker: DeliveryTracker,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn MeshTransport>, tracker: DeliveryTracker) -> Self {
        Self { transport: Some(transport), tracker }
    }

    /// Dispatcher with no device attached; every send fails with
    /// [`SubmitError::NotConnected`].
    pub fn disconnected(tracker: DeliveryTracker) -> Self {
        Self { transport: None, tracker }
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    pub fn tracker(&self) -> &DeliveryTracker {
        &self.tracker
    }

    /// Validate, encode and send a pigeon mail to its relay drone.
    ///
    /// Validation problems never reach the transport.
    pub fn submit_pigeon_mail(
        &self,
        form: &PigeonMailForm,
        reference: Option<Coordinate>,
    ) -> Result<Submission, SubmitError> {
        let message = form.validate(reference)?;
        let bytes = message.encode()?;
        let text = armor::wrap(&bytes);
        log::info!(
            "pigeon mail for {} via drone {} on channel {} ({} bytes)",
            message.envelope.recipient,
            message.drone,
            message.channel,
            bytes.len()
        );
        self.dispatch(text, Destination::from(message.drone), message.channel)
    }

    /// Send `text` as-is with `want_ack` set and track the outcome.
    pub fn dispatch(
        &self,
        text: String,
        destination: Destination,
        channel: u8,
    ) -> Result<Submission, SubmitError> {
        let transport = self.transport.clone().ok_or(SubmitError::NotConnected)?;
        let chat = ChatKey::for_destination(destination, channel);
        let outgoing = text.clone();
        let record_id = self.tracker.track(chat, async move {
            transport.send_text(&outgoing, destination, true, channel).await
        })?;
        Ok(Submission { record_id, chat, text })
    }
}
