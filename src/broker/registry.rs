//! Registry: the broker's two indices.
//!
//! `by_id` maps a subscriber id to its handle, `by_topic` maps a topic name
//! to the ids registered on it. Every method updates both indices, plus the
//! subscriber's own topic set, before returning, so that:
//! - an id is listed under a topic iff the subscriber's set contains the topic
//! - every id listed under a topic is present in `by_id`
//! - no topic is kept without subscribers
//!
//! `Subscriber::add_topic` and `Subscriber::remove_topic` change the local
//! set alone. Lookups and snapshots therefore count a pair only when both
//! sides agree, and `remove` sweeps whatever such calls left behind.
//!
//! A subscriber belongs to at most one registry at a time. Registering a
//! handle owned by another registry fails with `RegisteredElsewhere`.
//!
//! The registry has no lock of its own. The broker wraps it in one and the
//! subscriber locks taken in here always nest inside that lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::broker::topic::{SubscriberId, Topic};
use crate::subscriber::Subscriber;
use crate::utils::error::BrokerError;

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
pub struct Registry {
    owner: u64,
    by_id: HashMap<SubscriberId, Subscriber>,
    by_topic: HashMap<String, Topic>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            by_id: HashMap::new(),
            by_topic: HashMap::new(),
        }
    }

    /// Adds `subscriber` to the by-id index. Returns `false` if this very
    /// subscriber was already registered.
    pub fn register(&mut self, subscriber: &Subscriber) -> Result<bool, BrokerError> {
        if self.ensure_same(subscriber)? {
            return Ok(false);
        }
        subscriber.claim(self.owner)?;
        self.by_id
            .insert(subscriber.id().to_string(), subscriber.clone());
        Ok(true)
    }

    /// Registers `subscriber` under `topic` on both sides. Returns `false`
    /// if the pair was already registered.
    pub fn subscribe(&mut self, subscriber: &Subscriber, topic: &str) -> Result<bool, BrokerError> {
        let known = self.ensure_same(subscriber)?;
        if !known {
            subscriber.claim(self.owner)?;
        }
        let added = match subscriber.add_topic_if_active(topic) {
            Ok(added) => added,
            Err(err) => {
                if !known {
                    subscriber.release(self.owner);
                }
                return Err(err);
            }
        };

        let id = subscriber.id().to_string();
        if !known {
            self.by_id.insert(id.clone(), subscriber.clone());
        }
        let inserted = self
            .by_topic
            .entry(topic.to_string())
            .or_insert_with(|| Topic::new(topic))
            .subscribe(id);

        Ok(added || inserted)
    }

    /// Removes `subscriber` from `topic` on both sides and drops the topic if
    /// it became empty. Returns `false` if nothing changed.
    ///
    /// A handle that is not the one registered under its id is left alone.
    pub fn unsubscribe(&mut self, subscriber: &Subscriber, topic: &str) -> bool {
        let registered = self
            .by_id
            .get(subscriber.id())
            .is_some_and(|s| s.same_as(subscriber));
        if !registered {
            return false;
        }

        let removed = self.detach(subscriber.id(), topic);
        subscriber.remove_topic(topic) || removed
    }

    /// Removes the subscriber from every topic and from the by-id index.
    pub fn remove(&mut self, id: &str) -> Option<Subscriber> {
        let subscriber = self.by_id.remove(id)?;

        for topic in subscriber.topics() {
            self.detach(id, &topic);
            subscriber.remove_topic(&topic);
        }

        // Topics dropped locally through `Subscriber::remove_topic` are not
        // in the walk above.
        self.by_topic.retain(|_, t| {
            t.unsubscribe(id);
            !t.is_empty()
        });

        subscriber.release(self.owner);
        Some(subscriber)
    }

    /// Removes every subscriber, returning their handles.
    pub fn clear(&mut self) -> Vec<Subscriber> {
        let ids: Vec<SubscriberId> = self.by_id.keys().cloned().collect();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Handles of everyone currently registered on `topic`.
    pub fn snapshot(&self, topic: &str) -> Vec<Subscriber> {
        self.by_topic
            .get(topic)
            .map(|t| {
                t.subscribers
                    .iter()
                    .filter_map(|id| self.by_id.get(id))
                    .filter(|s| s.has_topic(topic))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<&Subscriber> {
        self.by_id.get(id)
    }

    pub fn topic(&self, name: &str) -> Option<&Topic> {
        self.by_topic.get(name)
    }

    pub fn topic_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .by_topic
            .values()
            .filter(|t| self.is_live(t))
            .map(|t| t.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn subscribers_of(&self, topic: &str) -> Vec<SubscriberId> {
        let mut ids: Vec<SubscriberId> = self
            .by_topic
            .get(topic)
            .map(|t| {
                t.subscribers
                    .iter()
                    .filter(|id| self.holds(id, topic))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub fn is_subscribed(&self, id: &str, topic: &str) -> bool {
        self.by_topic.get(topic).is_some_and(|t| t.contains(id)) && self.holds(id, topic)
    }

    pub fn topic_count(&self) -> usize {
        self.by_topic.values().filter(|t| self.is_live(t)).count()
    }

    pub fn subscriber_count(&self) -> usize {
        self.by_id.len()
    }

    /// `Ok(true)` if this handle is already registered, `Ok(false)` if the id
    /// is free, `DuplicateSubscriber` if the id belongs to another handle.
    fn ensure_same(&self, subscriber: &Subscriber) -> Result<bool, BrokerError> {
        match self.by_id.get(subscriber.id()) {
            Some(existing) if existing.same_as(subscriber) => Ok(true),
            Some(_) => Err(BrokerError::DuplicateSubscriber(
                subscriber.id().to_string(),
            )),
            None => Ok(false),
        }
    }

    /// The subscriber registered as `id` still wants `topic` on its side.
    fn holds(&self, id: &str, topic: &str) -> bool {
        self.by_id.get(id).is_some_and(|s| s.has_topic(topic))
    }

    fn is_live(&self, topic: &Topic) -> bool {
        topic
            .subscribers
            .iter()
            .any(|id| self.holds(id, &topic.name))
    }

    fn detach(&mut self, id: &str, topic: &str) -> bool {
        let Some(t) = self.by_topic.get_mut(topic) else {
            return false;
        };
        let removed = t.unsubscribe(id);
        if t.is_empty() {
            self.by_topic.remove(topic);
        }
        removed
    }
}
