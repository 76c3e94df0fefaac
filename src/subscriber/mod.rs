//! The `subscriber` module defines the endpoints messages are delivered to.
//!
//! It provides the [`Subscriber`] handle, which carries a subscriber's id,
//! its topic set and the sending half of its mailbox, and the [`Mailbox`]
//! the subscriber's owner reads delivered messages from.

pub mod handle;
pub mod mailbox;

pub use handle::{MAX_CAPACITY, Subscriber};
pub use mailbox::Mailbox;
