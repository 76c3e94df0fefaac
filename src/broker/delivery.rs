//! Delivery policy and the per-publish report.
//!
//! A publish never fails as a whole. Each subscriber on the topic either
//! receives the message or contributes one [`DeliveryFailure`] to the
//! [`PublishReport`]; the remaining subscribers are still served.

use std::time::Duration;

use tracing::{trace, warn};

use crate::broker::topic::SubscriberId;
use crate::utils::error::BrokerError;

/// What `publish` does when a bounded mailbox is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryPolicy {
    /// Report `MailboxFull` immediately and move on.
    #[default]
    DropOnFull,
    /// Wait up to the given duration for a free slot, then report `MailboxFull`.
    Wait(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub subscriber: SubscriberId,
    pub error: BrokerError,
}

/// Outcome of fanning one message out to its topic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub topic: String,
    pub delivered: Vec<SubscriberId>,
    pub failures: Vec<DeliveryFailure>,
}

impl PublishReport {
    pub fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, subscriber: &str, result: Result<(), BrokerError>) {
        match result {
            Ok(()) => {
                trace!(subscriber = %subscriber, topic = %self.topic, "Message delivered");
                self.delivered.push(subscriber.to_string());
            }
            Err(error) => {
                warn!(subscriber = %subscriber, topic = %self.topic, %error, "Delivery failed");
                self.failures.push(DeliveryFailure {
                    subscriber: subscriber.to_string(),
                    error,
                });
            }
        }
    }

    /// True when nobody on the topic missed the message. A publish to a topic
    /// without subscribers is complete.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// The failure recorded for `subscriber`, if any.
    pub fn failure_for(&self, subscriber: &str) -> Option<&BrokerError> {
        self.failures
            .iter()
            .find(|f| f.subscriber == subscriber)
            .map(|f| &f.error)
    }
}
