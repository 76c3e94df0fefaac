//! Mailbox: the queue a subscriber's owner drains.
//!
//! A mailbox is a tokio `mpsc` channel. The sending half lives inside the
//! [`Subscriber`](super::Subscriber) and is only ever used under the
//! subscriber's lock; the receiving half is the [`Mailbox`] returned to the
//! caller. A capacity of `0` selects an unbounded channel.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};

use crate::broker::message::Message;
use crate::broker::topic::SubscriberId;
use crate::utils::error::{BrokerError, MailboxError};

#[derive(Debug, Clone)]
pub(crate) enum MailboxSender {
    Bounded(mpsc::Sender<Message>),
    Unbounded(mpsc::UnboundedSender<Message>),
}

impl MailboxSender {
    /// Enqueues without waiting.
    pub(crate) fn try_send(&self, id: &str, message: Message) -> Result<(), BrokerError> {
        match self {
            Self::Bounded(tx) => tx.try_send(message).map_err(|e| match e {
                TrySendError::Full(_) => BrokerError::MailboxFull(id.to_string()),
                TrySendError::Closed(_) => BrokerError::MailboxClosed(id.to_string()),
            }),
            Self::Unbounded(tx) => tx
                .send(message)
                .map_err(|_| BrokerError::MailboxClosed(id.to_string())),
        }
    }
}

#[derive(Debug)]
enum Receiver {
    Bounded(mpsc::Receiver<Message>),
    Unbounded(mpsc::UnboundedReceiver<Message>),
}

/// The receiving half of a subscriber's mailbox.
///
/// Messages come out in the order they were delivered. Once the subscriber
/// is destructed the mailbox yields what is still queued and then reports
/// closed: `recv` returns `None` and the `Stream` implementation terminates.
#[derive(Debug)]
pub struct Mailbox {
    id: SubscriberId,
    receiver: Receiver,
}

pub(crate) fn channel(id: &str, capacity: usize) -> (MailboxSender, Mailbox) {
    let (sender, receiver) = if capacity == 0 {
        let (tx, rx) = mpsc::unbounded_channel();
        (MailboxSender::Unbounded(tx), Receiver::Unbounded(rx))
    } else {
        let (tx, rx) = mpsc::channel(capacity);
        (MailboxSender::Bounded(tx), Receiver::Bounded(rx))
    };

    let mailbox = Mailbox {
        id: id.to_string(),
        receiver,
    };
    (sender, mailbox)
}

impl Mailbox {
    /// Id of the subscriber this mailbox belongs to.
    pub fn subscriber_id(&self) -> &str {
        &self.id
    }

    /// Waits for the next message. Returns `None` once the mailbox is closed
    /// and empty.
    pub async fn recv(&mut self) -> Option<Message> {
        match &mut self.receiver {
            Receiver::Bounded(rx) => rx.recv().await,
            Receiver::Unbounded(rx) => rx.recv().await,
        }
    }

    /// Blocking variant of [`recv`](Self::recv) for plain threads.
    ///
    /// Panics if called from within an async runtime, like
    /// `tokio::sync::mpsc::Receiver::blocking_recv`.
    pub fn blocking_recv(&mut self) -> Option<Message> {
        match &mut self.receiver {
            Receiver::Bounded(rx) => rx.blocking_recv(),
            Receiver::Unbounded(rx) => rx.blocking_recv(),
        }
    }

    pub fn try_recv(&mut self) -> Result<Message, MailboxError> {
        let result = match &mut self.receiver {
            Receiver::Bounded(rx) => rx.try_recv(),
            Receiver::Unbounded(rx) => rx.try_recv(),
        };
        result.map_err(|e| match e {
            TryRecvError::Empty => MailboxError::Empty,
            TryRecvError::Disconnected => MailboxError::Closed,
        })
    }

    /// Takes every message currently queued without waiting for more.
    pub fn drain(&mut self) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.try_recv() {
            messages.push(msg);
        }
        messages
    }

    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<Message>> {
        match &mut self.receiver {
            Receiver::Bounded(rx) => rx.poll_recv(cx),
            Receiver::Unbounded(rx) => rx.poll_recv(cx),
        }
    }

    /// Closes the mailbox from the reading side.
    ///
    /// Queued messages can still be read; further deliveries fail with
    /// `MailboxClosed`.
    pub fn close(&mut self) {
        match &mut self.receiver {
            Receiver::Bounded(rx) => rx.close(),
            Receiver::Unbounded(rx) => rx.close(),
        }
    }

    /// True once every sending half is gone, i.e. the subscriber was
    /// destructed or the mailbox was closed from this side.
    pub fn is_closed(&self) -> bool {
        match &self.receiver {
            Receiver::Bounded(rx) => rx.is_closed(),
            Receiver::Unbounded(rx) => rx.is_closed(),
        }
    }

    pub fn len(&self) -> usize {
        match &self.receiver {
            Receiver::Bounded(rx) => rx.len(),
            Receiver::Unbounded(rx) => rx.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Stream for Mailbox {
    type Item = Message;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_recv(cx)
    }
}
