//! The `error` module defines the error types used within `popsub-core`.
//!
//! Registry mutations return [`BrokerError`] synchronously. During fan-out
//! the same type is attached to each failed delivery in a
//! [`PublishReport`](crate::broker::PublishReport) instead of aborting the
//! whole publish. The reading side of a mailbox reports [`MailboxError`].

use thiserror::Error;

use crate::broker::topic::SubscriberId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// The subscriber has been destructed and accepts no more messages or topics.
    #[error("subscriber {0} is inactive")]
    InactiveSubscriber(SubscriberId),

    /// A bounded mailbox had no free slot in time.
    #[error("mailbox of subscriber {0} is full")]
    MailboxFull(SubscriberId),

    /// The receiving half of the mailbox was dropped by its reader.
    #[error("mailbox of subscriber {0} is closed")]
    MailboxClosed(SubscriberId),

    #[error("subscriber {0} was already destructed")]
    DoubleDestruct(SubscriberId),

    #[error("invalid topic name: {0:?}")]
    InvalidTopic(String),

    /// Another subscriber with the same id is already registered.
    #[error("a different subscriber is already registered as {0}")]
    DuplicateSubscriber(SubscriberId),

    /// The subscriber handle already belongs to another broker.
    #[error("subscriber {0} is registered with another broker")]
    RegisteredElsewhere(SubscriberId),
}

impl BrokerError {
    /// The subscriber this error concerns, if any.
    pub fn subscriber(&self) -> Option<&SubscriberId> {
        match self {
            Self::InactiveSubscriber(id)
            | Self::MailboxFull(id)
            | Self::MailboxClosed(id)
            | Self::DoubleDestruct(id)
            | Self::DuplicateSubscriber(id)
            | Self::RegisteredElsewhere(id) => Some(id),
            Self::InvalidTopic(_) => None,
        }
    }
}

/// Errors returned when reading from a [`Mailbox`](crate::subscriber::Mailbox)
/// without waiting.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MailboxError {
    #[error("mailbox is empty")]
    Empty,

    /// The subscriber was destructed and every queued message has been read.
    #[error("mailbox is closed")]
    Closed,
}
