//! In-process transport for dry runs and tests.
//!
//! Nothing leaves the process: every send is recorded and settled according
//! to a per-destination script.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::transport::{Destination, MeshTransport, SendResult, TransportError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopbackBehavior {
    /// Resolve with the next sequential packet id.
    Acknowledge,
    /// Resolve without a packet id.
    NoMessageId,
    /// Reject, optionally after assigning the next packet id.
    Reject { reason: String, assign_id: bool },
    /// Never settle.
    Stall,
}

#[derive(Debug, Clone)]
struct Rule {
    behavior: LoopbackBehavior,
    delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentFrame {
    pub text: String,
    pub destination: Destination,
    pub want_ack: bool,
    pub channel: u8,
}

pub struct LoopbackTransport {
    next_id: AtomicU32,
    default_rule: Rule,
    rules: Mutex<HashMap<Destination, Rule>>,
    sent: Mutex<Vec<SentFrame>>,
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new(LoopbackBehavior::Acknowledge)
    }
}

impl LoopbackTransport {
    pub fn new(behavior: LoopbackBehavior) -> Self {
        Self {
            next_id: AtomicU32::new(1),
            default_rule: Rule { behavior, delay: Duration::ZERO },
            rules: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Start packet ids at `first_id`.
    pub fn with_first_id(self, first_id: u32) -> Self {
        self.next_id.store(first_id, Ordering::SeqCst);
        self
    }

    /// Override the outcome for one destination, settling after `delay`.
    pub fn script(&self, destination: Destination, behavior: LoopbackBehavior, delay: Duration) {
        let mut rules = self.rules.lock().expect("loopback rules mutex poisoned");
        rules.insert(destination, Rule { behavior, delay });
    }

    pub fn sent(&self) -> Vec<SentFrame> {
        self.sent.lock().expect("loopback sent mutex poisoned").clone()
    }

    fn rule_for(&self, destination: Destination) -> Rule {
        let rules = self.rules.lock().expect("loopback rules mutex poisoned");
        rules.get(&destination).cloned().unwrap_or_else(|| self.default_rule.clone())
    }

    fn allocate_id(&self) -> u32 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl MeshTransport for LoopbackTransport {
    async fn send_text(
        &self,
        text: &str,
        destination: Destination,
        want_ack: bool,
        channel: u8,
    ) -> SendResult {
        log::debug!("loopback send to {destination:?} on channel {channel}: {text}");
        self.sent.lock().expect("loopback sent mutex poisoned").push(SentFrame {
            text: text.to_owned(),
            destination,
            want_ack,
            channel,
        });

        let rule = self.rule_for(destination);
        if !rule.delay.is_zero() {
            tokio::time::sleep(rule.delay).await;
        }
        match rule.behavior {
            LoopbackBehavior::Acknowledge => Ok(Some(self.allocate_id())),
            LoopbackBehavior::NoMessageId => Ok(None),
            LoopbackBehavior::Reject { reason, assign_id } => {
                let err = TransportError::new(reason);
                Err(if assign_id { err.with_message_id(self.allocate_id()) } else { err })
            }
            LoopbackBehavior::Stall => std::future::pending().await,
        }
    }
}
