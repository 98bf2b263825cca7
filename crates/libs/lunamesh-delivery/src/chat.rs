use lunamesh_pigeon::utf8_len;

use crate::dispatch::{Dispatcher, Submission};
use crate::error::{SubmitError, ValidationError};
use crate::form::MAX_CHANNEL;
use crate::record::ChatKey;
use crate::transport::Destination;

pub const DEFAULT_CHAT_MAX_BYTES: usize = 200;

/// Plain text input bound to one conversation.
#[derive(Clone)]
pub struct ChatComposer {
    dispatcher: Dispatcher,
    destination: Destination,
    channel: u8,
    max_bytes: usize,
}

impl ChatComposer {
    pub fn new(dispatcher: Dispatcher, destination: Destination, channel: u8) -> Self {
        Self { dispatcher, destination, channel, max_bytes: DEFAULT_CHAT_MAX_BYTES }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn chat(&self) -> ChatKey {
        ChatKey::for_destination(self.destination, self.channel)
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Whether `draft` still fits the byte budget while typing.
    pub fn accepts(&self, draft: &str) -> bool {
        utf8_len(draft) <= self.max_bytes
    }

    /// Send the trimmed draft. Whitespace-only drafts are not sent.
    pub fn send_text(&self, draft: &str) -> Result<Submission, SubmitError> {
        let text = draft.trim();
        if text.is_empty() {
            return Err(SubmitError::EmptyMessage);
        }
        if self.channel > MAX_CHANNEL {
            return Err(ValidationError::OutOfRange {
                field: "channel",
                value: f64::from(self.channel),
                min: 0.0,
                max: f64::from(MAX_CHANNEL),
            }
            .into());
        }
        let bytes = utf8_len(text);
        if bytes > self.max_bytes {
            return Err(ValidationError::TextTooLong { bytes, max: self.max_bytes }.into());
        }
        self.dispatcher.dispatch(text.to_owned(), self.destination, self.channel)
    }
}
