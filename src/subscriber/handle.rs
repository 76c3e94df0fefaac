use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::mailbox::{self, Mailbox, MailboxSender};
use crate::broker::message::Message;
use crate::broker::topic::SubscriberId;
use crate::utils::error::BrokerError;

/// Largest bounded mailbox capacity; tokio's channel cannot hold more.
pub const MAX_CAPACITY: usize = tokio::sync::Semaphore::MAX_PERMITS;

#[derive(Debug)]
struct State {
    active: bool,
    topics: HashSet<String>,
    /// Sending half of the mailbox. `None` once destructed; taking it is
    /// what closes the mailbox, so it happens exactly once.
    sender: Option<MailboxSender>,
    /// Registry this subscriber is registered with, if any.
    owner: Option<u64>,
}

#[derive(Debug)]
struct Inner {
    id: SubscriberId,
    capacity: usize,
    state: RwLock<State>,
}

/// A named endpoint in the Pub/Sub system.
///
/// A `Subscriber` owns the sending half of a mailbox and the set of topics
/// it wants delivery for. It is a cheap handle: clones share the same state,
/// so the broker and the caller can both keep one.
///
/// Every read or write of the subscriber's state goes through its own lock,
/// independent of the broker's. The broker always takes its own lock first.
#[derive(Debug, Clone)]
pub struct Subscriber {
    inner: Arc<Inner>,
}

impl Subscriber {
    /// Creates a subscriber with an empty topic set and an open mailbox.
    ///
    /// `capacity` bounds the number of queued messages; `0` makes the
    /// mailbox unbounded. Capacities above [`MAX_CAPACITY`] are clamped to it.
    pub fn new(id: impl Into<SubscriberId>, capacity: usize) -> (Self, Mailbox) {
        let id = id.into();
        let capacity = capacity.min(MAX_CAPACITY);
        let (sender, mailbox) = mailbox::channel(&id, capacity);

        let subscriber = Self {
            inner: Arc::new(Inner {
                id,
                capacity,
                state: RwLock::new(State {
                    active: true,
                    topics: HashSet::new(),
                    sender: Some(sender),
                    owner: None,
                }),
            }),
        };
        (subscriber, mailbox)
    }

    /// Creates a subscriber with a `subscriber-<uuid>` id.
    pub fn with_generated_id(capacity: usize) -> (Self, Mailbox) {
        Self::new(format!("subscriber-{}", Uuid::new_v4()), capacity)
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Mailbox capacity, `0` meaning unbounded.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.read().active
    }

    /// Sorted snapshot of the topics this subscriber is registered for.
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.inner.state.read().topics.iter().cloned().collect();
        topics.sort();
        topics
    }

    pub fn has_topic(&self, topic: &str) -> bool {
        self.inner.state.read().topics.contains(topic)
    }

    /// Records local interest in `topic`. Returns `false` if it was already
    /// present.
    ///
    /// This only touches the subscriber's own set. A broker delivers a topic
    /// only when both its index and this set hold it, so adding a topic here
    /// alone starts no delivery. Go through
    /// [`Broker::subscribe`](crate::broker::Broker::subscribe) to register
    /// interest with a broker; it calls this under the broker lock.
    pub fn add_topic(&self, topic: &str) -> bool {
        self.inner.state.write().topics.insert(topic.to_string())
    }

    /// Drops local interest in `topic`. Removing an absent topic is a no-op
    /// and returns `false`.
    ///
    /// Delivery of `topic` stops at once, even though a broker may still list
    /// the pair until the next `unsubscribe` or `remove_subscriber`.
    pub fn remove_topic(&self, topic: &str) -> bool {
        self.inner.state.write().topics.remove(topic)
    }

    /// Like `add_topic`, but refuses a destructed subscriber. The check and
    /// the insert share one critical section.
    pub(crate) fn add_topic_if_active(&self, topic: &str) -> Result<bool, BrokerError> {
        let mut state = self.inner.state.write();
        if !state.active {
            return Err(self.inactive());
        }
        Ok(state.topics.insert(topic.to_string()))
    }

    /// Binds the subscriber to the registry `owner`. Returns `Ok(false)` if it
    /// was already bound to it.
    pub(crate) fn claim(&self, owner: u64) -> Result<bool, BrokerError> {
        let mut state = self.inner.state.write();
        if !state.active {
            return Err(self.inactive());
        }
        match state.owner {
            Some(current) if current == owner => Ok(false),
            Some(_) => Err(BrokerError::RegisteredElsewhere(self.inner.id.clone())),
            None => {
                state.owner = Some(owner);
                Ok(true)
            }
        }
    }

    /// Undoes [`claim`](Self::claim). A different owner is left in place.
    pub(crate) fn release(&self, owner: u64) {
        let mut state = self.inner.state.write();
        if state.owner == Some(owner) {
            state.owner = None;
        }
    }

    /// Marks the subscriber inactive and closes its mailbox.
    ///
    /// Irreversible. Any later call returns `DoubleDestruct` and leaves the
    /// mailbox alone. Messages already queued stay readable.
    pub fn destruct(&self) -> Result<(), BrokerError> {
        let mut state = self.inner.state.write();
        if !state.active {
            return Err(BrokerError::DoubleDestruct(self.inner.id.clone()));
        }
        state.active = false;
        drop(state.sender.take());
        info!(subscriber = %self.inner.id, "Subscriber destructed");
        Ok(())
    }

    /// Delivers `message` without waiting.
    ///
    /// Fails with `InactiveSubscriber` after `destruct`, `MailboxFull` when a
    /// bounded mailbox has no free slot and `MailboxClosed` when the reader
    /// dropped or closed its mailbox.
    pub fn try_deliver(&self, message: Message) -> Result<(), BrokerError> {
        let state = self.inner.state.read();
        match &state.sender {
            Some(sender) if state.active => sender.try_send(&self.inner.id, message),
            _ => Err(self.inactive()),
        }
    }

    /// Delivers `message`, waiting at most `timeout` for a free slot in a
    /// bounded mailbox. Unbounded mailboxes never wait.
    ///
    /// The subscriber lock is not held while waiting. Once a slot is
    /// reserved the active flag is checked again under the lock, so a
    /// `destruct` that happened during the wait still wins.
    pub async fn deliver_timeout(
        &self,
        message: Message,
        timeout: Duration,
    ) -> Result<(), BrokerError> {
        let sender = {
            let state = self.inner.state.read();
            match &state.sender {
                Some(MailboxSender::Bounded(tx)) if state.active => tx.clone(),
                Some(unbounded) if state.active => {
                    return unbounded.try_send(&self.inner.id, message);
                }
                _ => return Err(self.inactive()),
            }
        };

        let permit = match tokio::time::timeout(timeout, sender.reserve()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(BrokerError::MailboxClosed(self.inner.id.clone())),
            Err(_) => {
                debug!(subscriber = %self.inner.id, ?timeout, "Timed out waiting for mailbox slot");
                return Err(BrokerError::MailboxFull(self.inner.id.clone()));
            }
        };

        let state = self.inner.state.read();
        if !state.active {
            return Err(self.inactive());
        }
        permit.send(message);
        Ok(())
    }

    /// True if both handles point at the same subscriber.
    pub fn same_as(&self, other: &Subscriber) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn inactive(&self) -> BrokerError {
        BrokerError::InactiveSubscriber(self.inner.id.clone())
    }
}
