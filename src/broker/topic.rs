use std::collections::HashSet;

use crate::utils::error::BrokerError;

pub type SubscriberId = String;

/// Represents a topic in the broker's registry.
///
/// Holds the ids of the subscribers currently registered for the topic.
/// A `Topic` only exists while it has at least one subscriber; the registry
/// removes it as soon as the set becomes empty.
#[derive(Debug, Default)]
pub struct Topic {
    pub name: String,
    pub subscribers: HashSet<SubscriberId>,
}

impl Topic {
    /// Creates a new topic with the given name and no subscribers.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: HashSet::new(),
        }
    }

    /// Adds a subscriber to the topic. Returns `false` if it was already there.
    pub fn subscribe(&mut self, id: SubscriberId) -> bool {
        self.subscribers.insert(id)
    }

    /// Removes a subscriber from the topic. Returns `false` if it was not there.
    pub fn unsubscribe(&mut self, id: &str) -> bool {
        self.subscribers.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.subscribers.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }
}

/// Checks that `name` can be used as a topic.
///
/// A topic must be non-empty, carry no leading or trailing whitespace and
/// contain no control characters.
pub fn validate_topic(name: &str) -> Result<(), BrokerError> {
    let valid = !name.is_empty()
        && name.trim() == name
        && !name.chars().any(char::is_control);

    if valid {
        Ok(())
    } else {
        Err(BrokerError::InvalidTopic(name.to_string()))
    }
}
