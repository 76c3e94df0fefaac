//! Broker engine
//!
//! The broker owns the [`Registry`] behind a single read-write lock:
//! - `subscribe`, `unsubscribe`, `register_subscriber` and
//!   `remove_subscriber` take it exclusively
//! - `publish` and the queries take it shared, and `publish` only long
//!   enough to snapshot the subscribers of the topic
//!
//! Delivery happens after the lock is released, so a slow mailbox never
//! stalls registry mutations. The broker is `Sync`; share it as
//! `Arc<Broker>` across threads or tasks.

use parking_lot::RwLock;
use tracing::{debug, info, trace};

use crate::broker::delivery::{DeliveryPolicy, PublishReport};
use crate::broker::message::Message;
use crate::broker::registry::Registry;
use crate::broker::topic::{SubscriberId, validate_topic};
use crate::config::BrokerSettings;
use crate::subscriber::{Mailbox, Subscriber};
use crate::utils::error::BrokerError;

#[derive(Debug)]
pub struct Broker {
    registry: RwLock<Registry>,
    policy: DeliveryPolicy,
    default_capacity: usize,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker {
    /// Creates a broker with the default settings: drop-on-full delivery and
    /// the default mailbox capacity for `new_subscriber`.
    pub fn new() -> Self {
        Self::from_settings(&BrokerSettings::default())
    }

    pub fn with_policy(policy: DeliveryPolicy) -> Self {
        Self {
            registry: RwLock::new(Registry::new()),
            policy,
            default_capacity: BrokerSettings::default().default_mailbox_capacity,
        }
    }

    pub fn from_settings(settings: &BrokerSettings) -> Self {
        Self {
            registry: RwLock::new(Registry::new()),
            policy: settings.delivery_policy(),
            default_capacity: settings.default_mailbox_capacity,
        }
    }

    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    /// Capacity given to mailboxes created through `new_subscriber`.
    pub fn default_mailbox_capacity(&self) -> usize {
        self.default_capacity
    }

    /// Creates a subscriber with the default mailbox capacity and registers it.
    pub fn new_subscriber(
        &self,
        id: impl Into<SubscriberId>,
    ) -> Result<(Subscriber, Mailbox), BrokerError> {
        let (subscriber, mailbox) = Subscriber::new(id, self.default_capacity);
        self.register_subscriber(&subscriber)?;
        Ok((subscriber, mailbox))
    }

    /// Tracks `subscriber` by id without subscribing it to anything.
    /// Registering the same handle again is a no-op. A subscriber belongs to
    /// one broker at a time; a handle still registered with another broker
    /// is refused with `RegisteredElsewhere`.
    pub fn register_subscriber(&self, subscriber: &Subscriber) -> Result<(), BrokerError> {
        if self.registry.write().register(subscriber)? {
            debug!(subscriber = %subscriber.id(), "Registered subscriber");
        }
        Ok(())
    }

    /// Subscribes `subscriber` to `topic`.
    ///
    /// Registers the subscriber if needed and records the topic both in the
    /// registry and in the subscriber's own set. Repeating the call is a
    /// no-op. Fails for invalid topic names, destructed subscribers, ids
    /// already taken by a different subscriber and handles registered with
    /// another broker.
    pub fn subscribe(&self, subscriber: &Subscriber, topic: &str) -> Result<(), BrokerError> {
        validate_topic(topic)?;

        if self.registry.write().subscribe(subscriber, topic)? {
            debug!(subscriber = %subscriber.id(), topic = %topic, "Subscribed");
        }
        Ok(())
    }

    /// Inverse of [`subscribe`](Self::subscribe). Unsubscribing a pair that
    /// is not subscribed is a no-op. The topic is dropped once its last
    /// subscriber leaves.
    pub fn unsubscribe(&self, subscriber: &Subscriber, topic: &str) -> Result<(), BrokerError> {
        validate_topic(topic)?;

        if self.registry.write().unsubscribe(subscriber, topic) {
            debug!(subscriber = %subscriber.id(), topic = %topic, "Unsubscribed");
        }
        Ok(())
    }

    /// Removes the subscriber from every topic and forgets it. The subscriber
    /// itself stays active; see [`destruct_subscriber`](Self::destruct_subscriber).
    pub fn remove_subscriber(&self, id: &str) -> Option<Subscriber> {
        let removed = self.registry.write().remove(id);
        if removed.is_some() {
            debug!(subscriber = %id, "Removed subscriber");
        }
        removed
    }

    /// Removes the subscriber and destructs it, closing its mailbox.
    /// Returns the removed handle, or `None` for an unknown id. A subscriber
    /// destructed earlier is still removed and returned.
    pub fn destruct_subscriber(&self, id: &str) -> Option<Subscriber> {
        let subscriber = self.remove_subscriber(id)?;
        if subscriber.destruct().is_err() {
            debug!(subscriber = %id, "Subscriber was already destructed");
        }
        Some(subscriber)
    }

    /// Publishes `message` to every subscriber of its topic.
    ///
    /// Bounded mailboxes are served according to the broker's
    /// [`DeliveryPolicy`]. A failing subscriber is recorded in the report and
    /// never keeps the message from the others. A topic without subscribers
    /// yields an empty report.
    pub async fn publish(&self, message: Message) -> PublishReport {
        let targets = self.registry.read().snapshot(message.topic());
        let mut report = PublishReport::new(message.topic());

        if targets.is_empty() {
            trace!(topic = %message.topic(), "No subscribers for topic");
            return report;
        }

        for subscriber in targets {
            let result = match self.policy {
                DeliveryPolicy::DropOnFull => subscriber.try_deliver(message.clone()),
                DeliveryPolicy::Wait(timeout) => {
                    subscriber.deliver_timeout(message.clone(), timeout).await
                }
            };
            report.record(subscriber.id(), result);
        }

        report
    }

    /// Non-blocking publish for callers outside an async runtime. Full
    /// mailboxes are always reported as `MailboxFull`, whatever the policy.
    pub fn try_publish(&self, message: Message) -> PublishReport {
        let targets = self.registry.read().snapshot(message.topic());
        let mut report = PublishReport::new(message.topic());

        for subscriber in targets {
            let result = subscriber.try_deliver(message.clone());
            report.record(subscriber.id(), result);
        }

        report
    }

    /// Removes every subscriber and, with `destruct`, closes their mailboxes.
    /// Subscribers destructed earlier are skipped silently.
    pub fn shutdown(&self, destruct: bool) -> Vec<Subscriber> {
        let removed = self.registry.write().clear();

        if destruct {
            for subscriber in &removed {
                // DoubleDestruct only means the owner got there first.
                let _ = subscriber.destruct();
            }
        }

        info!(subscribers = removed.len(), destruct, "Broker shut down");
        removed
    }

    /// Sorted names of the topics with at least one subscriber.
    pub fn topics(&self) -> Vec<String> {
        self.registry.read().topic_names()
    }

    /// Sorted ids of the subscribers registered on `topic`.
    pub fn subscribers_of(&self, topic: &str) -> Vec<SubscriberId> {
        self.registry.read().subscribers_of(topic)
    }

    pub fn subscriber(&self, id: &str) -> Option<Subscriber> {
        self.registry.read().get(id).cloned()
    }

    pub fn is_subscribed(&self, id: &str, topic: &str) -> bool {
        self.registry.read().is_subscribed(id, topic)
    }

    pub fn topic_count(&self) -> usize {
        self.registry.read().topic_count()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.read().subscriber_count()
    }
}
