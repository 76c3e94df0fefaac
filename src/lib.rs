//! # PopSub Core
//!
//! `popsub-core` is the in-process heart of a publish/subscribe system: a
//! registry mapping topics to subscribers, and a fan-out that delivers each
//! published message into the mailbox of every subscriber registered for
//! its topic. There is no network transport and no persistence; everything
//! lives in one process's memory.
//!
//! ## Core Modules
//!
//! - `broker`: the `Broker`, its registry, messages and publish reports.
//! - `subscriber`: the `Subscriber` handle and the `Mailbox` its owner drains.
//! - `config`: loading broker and logging settings.
//! - `utils`: error types and tracing setup.
//!
//! ## Example
//!
//! ```rust
//! use popsub_core::broker::{Broker, Message};
//! use popsub_core::subscriber::Subscriber;
//!
//! let broker = Broker::new();
//! let (reader, mut mailbox) = Subscriber::new("a1", 10);
//! broker.subscribe(&reader, "news").unwrap();
//!
//! let report = broker.try_publish(Message::new("news", "hello"));
//! assert!(report.is_complete());
//! assert_eq!(mailbox.try_recv().unwrap().body(), "hello");
//! ```

pub mod broker;
pub mod config;
pub mod subscriber;
pub mod utils;

pub use broker::{Broker, Message, PublishReport};
pub use subscriber::{Mailbox, Subscriber};
pub use utils::error::{BrokerError, MailboxError};
