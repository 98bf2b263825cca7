use serde::{Deserialize, Serialize};

use crate::transport::{Destination, MessageId};

/// Local identifier of a delivery record, unique for the tracker's lifetime.
pub type RecordId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    Broadcast,
    Direct,
}

/// Conversation thread a status update belongs to.
///
/// Broadcast chats are keyed by channel index, direct chats by the peer's
/// node number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatKey {
    pub kind: ChatKind,
    pub identity: u32,
}

impl ChatKey {
    pub fn broadcast(channel: u8) -> Self {
        Self { kind: ChatKind::Broadcast, identity: u32::from(channel) }
    }

    pub fn direct(node_num: u32) -> Self {
        Self { kind: ChatKind::Direct, identity: node_num }
    }

    /// Chat thread for a message sent to `destination` on `channel`.
    pub fn for_destination(destination: Destination, channel: u8) -> Self {
        match destination {
            Destination::Broadcast => Self::broadcast(channel),
            Destination::Node(node) => Self::direct(node.as_u32()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    Sending,
    Acknowledged,
    Failed,
}

impl DeliveryState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Sending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum FailureCause {
    /// The transport rejected the send.
    Rejected { reason: String },
    /// The transport resolved without a packet id.
    MissingMessageId,
    /// The transport never settled within the configured bound.
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub record_id: RecordId,
    pub chat: ChatKey,
    pub message_id: Option<MessageId>,
    pub state: DeliveryState,
    pub failure: Option<FailureCause>,
}

impl DeliveryRecord {
    pub(crate) fn sending(record_id: RecordId, chat: ChatKey) -> Self {
        Self { record_id, chat, message_id: None, state: DeliveryState::Sending, failure: None }
    }
}

/// Lifecycle notifications for observers of the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DeliveryEvent {
    Created { record: DeliveryRecord },
    Settled { record: DeliveryRecord },
}

impl DeliveryEvent {
    pub fn record(&self) -> &DeliveryRecord {
        match self {
            Self::Created { record } | Self::Settled { record } => record,
        }
    }
}
