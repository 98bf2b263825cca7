use async_trait::async_trait;
use lunamesh_pigeon::NodeId;
use serde::{Deserialize, Serialize};

/// Packet identifier assigned by the mesh device.
pub type MessageId = u32;

/// Where a text message is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Broadcast,
    Node(NodeId),
}

impl Destination {
    /// Numeric destination as the device expects it.
    pub fn node_num(self) -> u32 {
        match self {
            Self::Broadcast => NodeId::BROADCAST.as_u32(),
            Self::Node(node) => node.as_u32(),
        }
    }
}

impl From<NodeId> for Destination {
    fn from(node: NodeId) -> Self {
        if node.is_broadcast() {
            Self::Broadcast
        } else {
            Self::Node(node)
        }
    }
}

/// A failed send.
///
/// The device may assign a packet id before the send fails further down
/// the mesh; that id is kept so the failure can still be matched to the
/// message it belongs to.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[error("transport error: {message}")]
pub struct TransportError {
    pub message: String,
    pub message_id: Option<MessageId>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), message_id: None }
    }

    pub fn with_message_id(mut self, message_id: MessageId) -> Self {
        self.message_id = Some(message_id);
        self
    }
}

/// Settled result of one transport send. `Ok(None)` means the device
/// accepted the call but returned no packet id.
pub type SendResult = Result<Option<MessageId>, TransportError>;

/// The mesh device connection as seen by the delivery core.
///
/// Implementations own retries, encryption and fragmentation. The returned
/// future must settle exactly once.
#[async_trait]
pub trait MeshTransport: Send + Sync {
    async fn send_text(
        &self,
        text: &str,
        destination: Destination,
        want_ack: bool,
        channel: u8,
    ) -> SendResult;
}
