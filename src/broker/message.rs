use serde::{Deserialize, Serialize};

/// Represents a published message in the Pub/Sub system.
///
/// A message consists of the topic it is routed by and an opaque body.
/// Once constructed a message is immutable: the fields are private and the
/// broker hands every subscriber its own clone.
///
/// # Example
///
/// ```rust
/// use popsub_core::broker::message::Message;
///
/// let msg = Message::new("sensor_updates", "{\"temp\":25}");
/// assert_eq!(msg.topic(), "sensor_updates");
/// assert_eq!(msg.body(), "{\"temp\":25}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    topic: String,
    body: String,
}

impl Message {
    pub fn new(topic: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            body: body.into(),
        }
    }

    /// The topic this message is routed by.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The opaque payload.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Consumes the message, returning `(topic, body)`.
    pub fn into_parts(self) -> (String, String) {
        (self.topic, self.body)
    }
}
