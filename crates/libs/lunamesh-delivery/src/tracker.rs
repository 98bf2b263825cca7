//! Per-message delivery state.
//!
//! Every submission gets a [`DeliveryRecord`] in `Sending`; the spawned
//! settle task moves it to `Acknowledged` or `Failed` exactly once. Records
//! live until an explicit [`DeliveryTracker::clear`] or
//! [`DeliveryTracker::clear_chat`].

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::broadcast;

use crate::record::{
    ChatKey, DeliveryEvent, DeliveryRecord, DeliveryState, FailureCause, RecordId,
};
use crate::transport::{MessageId, SendResult, TransportError};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    #[error("unknown delivery record {0}")]
    UnknownRecord(RecordId),

    #[error("delivery record {record_id} already settled as {state:?}")]
    AlreadySettled { record_id: RecordId, state: DeliveryState },

    #[error("no tokio runtime to settle the send on")]
    NoRuntime,
}

/// How a transport send ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Resolved(Option<MessageId>),
    Rejected(TransportError),
    TimedOut,
}

impl From<SendResult> for Settlement {
    fn from(result: SendResult) -> Self {
        match result {
            Ok(message_id) => Self::Resolved(message_id),
            Err(err) => Self::Rejected(err),
        }
    }
}

impl Settlement {
    fn apply(self, record: &mut DeliveryRecord) {
        match self {
            Self::Resolved(Some(message_id)) => {
                record.message_id = Some(message_id);
                record.state = DeliveryState::Acknowledged;
            }
            Self::Resolved(None) => {
                record.state = DeliveryState::Failed;
                record.failure = Some(FailureCause::MissingMessageId);
            }
            Self::Rejected(err) => {
                record.message_id = err.message_id;
                record.state = DeliveryState::Failed;
                record.failure = Some(FailureCause::Rejected { reason: err.message });
            }
            Self::TimedOut => {
                record.state = DeliveryState::Failed;
                record.failure = Some(FailureCause::Timeout);
            }
        }
    }
}

#[derive(Default)]
struct Store {
    next_id: RecordId,
    records: BTreeMap<RecordId, DeliveryRecord>,
}

struct Inner {
    store: Mutex<Store>,
    events: broadcast::Sender<DeliveryEvent>,
    settle_timeout: Option<Duration>,
}

/// Shared handle to the delivery record store.
///
/// Create one at startup and clone it wherever sends are issued; all clones
/// see the same records.
#[derive(Clone)]
pub struct DeliveryTracker {
    inner: Arc<Inner>,
}

impl Default for DeliveryTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliveryTracker {
    /// Tracker that waits on transport futures for as long as they take.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Tracker that fails a send with [`FailureCause::Timeout`] when the
    /// transport has not settled after `timeout`.
    pub fn with_settle_timeout(timeout: Duration) -> Self {
        Self::build(Some(timeout))
    }

    fn build(settle_timeout: Option<Duration>) -> Self {
        let (events, _rx) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner { store: Mutex::new(Store::default()), events, settle_timeout }),
        }
    }

    pub fn settle_timeout(&self) -> Option<Duration> {
        self.inner.settle_timeout
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeliveryEvent> {
        self.inner.events.subscribe()
    }

    /// Open a new record in `Sending` for `chat`.
    pub fn begin(&self, chat: ChatKey) -> DeliveryRecord {
        let record = {
            let mut store = self.inner.store.lock().expect("delivery store mutex poisoned");
            store.next_id += 1;
            let record = DeliveryRecord::sending(store.next_id, chat);
            store.records.insert(record.record_id, record.clone());
            record
        };
        log::debug!("delivery record {} opened for {:?}", record.record_id, chat);
        let _ = self.inner.events.send(DeliveryEvent::Created { record: record.clone() });
        record
    }

    /// Record a send for `chat` and settle it in the background once `send`
    /// completes. Returns immediately.
    ///
    /// Outside a Tokio runtime no record is opened and
    /// [`TrackerError::NoRuntime`] is returned.
    pub fn track<F>(&self, chat: ChatKey, send: F) -> Result<RecordId, TrackerError>
    where
        F: Future<Output = SendResult> + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| TrackerError::NoRuntime)?;
        let record_id = self.begin(chat).record_id;
        let tracker = self.clone();
        runtime.spawn(async move {
            let settlement = match tracker.inner.settle_timeout {
                Some(limit) => match tokio::time::timeout(limit, send).await {
                    Ok(result) => Settlement::from(result),
                    Err(_) => Settlement::TimedOut,
                },
                None => Settlement::from(send.await),
            };
            if let Err(err) = tracker.settle(record_id, settlement) {
                // cleared while the send was in flight
                log::debug!("dropping settlement: {err}");
            }
        });
        Ok(record_id)
    }

    /// Apply the terminal transition for `record_id`.
    pub fn settle(
        &self,
        record_id: RecordId,
        settlement: Settlement,
    ) -> Result<DeliveryRecord, TrackerError> {
        let record = {
            let mut store = self.inner.store.lock().expect("delivery store mutex poisoned");
            let record =
                store.records.get_mut(&record_id).ok_or(TrackerError::UnknownRecord(record_id))?;
            if record.state.is_terminal() {
                return Err(TrackerError::AlreadySettled { record_id, state: record.state });
            }
            settlement.apply(record);
            record.clone()
        };

        match &record.failure {
            None => log::info!(
                "delivery record {} acknowledged message_id={:?}",
                record.record_id,
                record.message_id
            ),
            Some(cause) => log::warn!(
                "delivery record {} failed message_id={:?} cause={:?}",
                record.record_id,
                record.message_id,
                cause
            ),
        }
        let _ = self.inner.events.send(DeliveryEvent::Settled { record: record.clone() });
        Ok(record)
    }

    pub fn get(&self, record_id: RecordId) -> Option<DeliveryRecord> {
        let store = self.inner.store.lock().expect("delivery store mutex poisoned");
        store.records.get(&record_id).cloned()
    }

    /// Records of one chat, oldest first.
    pub fn records_for(&self, chat: ChatKey) -> Vec<DeliveryRecord> {
        let store = self.inner.store.lock().expect("delivery store mutex poisoned");
        store.records.values().filter(|record| record.chat == chat).cloned().collect()
    }

    /// Latest record in `chat` carrying `message_id`.
    pub fn find_by_message_id(
        &self,
        chat: ChatKey,
        message_id: MessageId,
    ) -> Option<DeliveryRecord> {
        let store = self.inner.store.lock().expect("delivery store mutex poisoned");
        store
            .records
            .values()
            .rev()
            .find(|record| record.chat == chat && record.message_id == Some(message_id))
            .cloned()
    }

    pub fn snapshot(&self) -> Vec<DeliveryRecord> {
        let store = self.inner.store.lock().expect("delivery store mutex poisoned");
        store.records.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.store.lock().expect("delivery store mutex poisoned").records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every record. Record ids keep counting up.
    pub fn clear(&self) -> usize {
        let mut store = self.inner.store.lock().expect("delivery store mutex poisoned");
        let removed = store.records.len();
        store.records.clear();
        removed
    }

    /// Drop the records of one chat.
    pub fn clear_chat(&self, chat: ChatKey) -> usize {
        let mut store = self.inner.store.lock().expect("delivery store mutex poisoned");
        let before = store.records.len();
        store.records.retain(|_, record| record.chat != chat);
        before - store.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat() -> ChatKey {
        ChatKey::direct(0x433d_7cd8)
    }

    #[test]
    fn begin_opens_sending_record() {
        let tracker = DeliveryTracker::new();
        let record = tracker.begin(chat());
        assert_eq!(record.state, DeliveryState::Sending);
        assert_eq!(record.message_id, None);
        assert_eq!(tracker.get(record.record_id), Some(record));
    }

    #[test]
    fn resolved_id_acknowledges() {
        let tracker = DeliveryTracker::new();
        let id = tracker.begin(chat()).record_id;
        let record = tracker.settle(id, Settlement::Resolved(Some(42))).expect("settle");
        assert_eq!(record.state, DeliveryState::Acknowledged);
        assert_eq!(record.message_id, Some(42));
        assert_eq!(record.failure, None);
    }

    #[test]
    fn resolved_without_id_fails() {
        let tracker = DeliveryTracker::new();
        let id = tracker.begin(chat()).record_id;
        let record = tracker.settle(id, Settlement::Resolved(None)).expect("settle");
        assert_eq!(record.state, DeliveryState::Failed);
        assert_eq!(record.failure, Some(FailureCause::MissingMessageId));
    }

    #[test]
    fn rejection_keeps_partial_id() {
        let tracker = DeliveryTracker::new();
        let id = tracker.begin(chat()).record_id;
        let err = TransportError::new("max retransmit").with_message_id(17);
        let record = tracker.settle(id, Settlement::Rejected(err)).expect("settle");
        assert_eq!(record.state, DeliveryState::Failed);
        assert_eq!(record.message_id, Some(17));
        assert_eq!(
            record.failure,
            Some(FailureCause::Rejected { reason: "max retransmit".into() })
        );
    }

    #[test]
    fn terminal_records_do_not_move() {
        let tracker = DeliveryTracker::new();
        let id = tracker.begin(chat()).record_id;
        tracker.settle(id, Settlement::Resolved(Some(1))).expect("settle");
        assert_eq!(
            tracker.settle(id, Settlement::TimedOut),
            Err(TrackerError::AlreadySettled { record_id: id, state: DeliveryState::Acknowledged })
        );
        assert_eq!(tracker.get(id).map(|r| r.state), Some(DeliveryState::Acknowledged));
    }

    #[test]
    fn unknown_record_is_an_error() {
        let tracker = DeliveryTracker::new();
        assert_eq!(
            tracker.settle(99, Settlement::Resolved(Some(1))),
            Err(TrackerError::UnknownRecord(99))
        );
    }

    #[test]
    fn resubmission_gets_a_new_record() {
        let tracker = DeliveryTracker::new();
        let first = tracker.begin(chat()).record_id;
        tracker
            .settle(first, Settlement::Rejected(TransportError::new("timeout")))
            .expect("settle");
        let second = tracker.begin(chat()).record_id;
        assert_ne!(first, second);
        assert_eq!(tracker.records_for(chat()).len(), 2);
    }

    #[test]
    fn find_by_message_id_prefers_latest() {
        let tracker = DeliveryTracker::new();
        let a = tracker.begin(chat()).record_id;
        let b = tracker.begin(chat()).record_id;
        tracker.settle(a, Settlement::Resolved(Some(5))).expect("settle");
        tracker.settle(b, Settlement::Resolved(Some(5))).expect("settle");
        assert_eq!(tracker.find_by_message_id(chat(), 5).map(|r| r.record_id), Some(b));
        assert_eq!(tracker.find_by_message_id(ChatKey::broadcast(0), 5), None);
    }

    #[test]
    fn clear_is_explicit_and_scoped() {
        let tracker = DeliveryTracker::new();
        tracker.begin(chat());
        tracker.begin(ChatKey::broadcast(0));
        assert_eq!(tracker.clear_chat(chat()), 1);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.clear(), 1);
        assert!(tracker.is_empty());
        assert_eq!(tracker.begin(chat()).record_id, 3);
    }

    #[test]
    fn clones_share_state() {
        let tracker = DeliveryTracker::new();
        let other = tracker.clone();
        let id = tracker.begin(chat()).record_id;
        assert!(other.get(id).is_some());
    }

    #[tokio::test]
    async fn track_settles_in_background() {
        let tracker = DeliveryTracker::new();
        let mut events = tracker.subscribe();
        let id = tracker.track(chat(), async { Ok(Some(42)) }).expect("runtime");

        let created = events.recv().await.expect("created event");
        assert!(matches!(created, DeliveryEvent::Created { .. }));
        let settled = events.recv().await.expect("settled event");
        assert_eq!(settled.record().record_id, id);
        assert_eq!(settled.record().state, DeliveryState::Acknowledged);
        assert_eq!(settled.record().message_id, Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn track_times_out_stalled_send() {
        let tracker = DeliveryTracker::with_settle_timeout(Duration::from_secs(30));
        let mut events = tracker.subscribe();
        let id = tracker.track(chat(), std::future::pending::<SendResult>()).expect("runtime");
        assert_eq!(tracker.get(id).map(|r| r.state), Some(DeliveryState::Sending));

        let _created = events.recv().await.expect("created event");
        let settled = events.recv().await.expect("settled event");
        assert_eq!(settled.record().state, DeliveryState::Failed);
        assert_eq!(settled.record().failure, Some(FailureCause::Timeout));
    }

    #[test]
    fn track_without_runtime_opens_nothing() {
        let tracker = DeliveryTracker::new();
        let result = tracker.track(chat(), async { Ok(Some(1)) });
        assert_eq!(result, Err(TrackerError::NoRuntime));
        assert!(tracker.is_empty());
    }
}
