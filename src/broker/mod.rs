pub mod delivery;
pub mod engine;
pub mod message;
pub mod registry;
pub mod topic;

pub use delivery::{DeliveryFailure, DeliveryPolicy, PublishReport};
pub use engine::Broker;
pub use message::Message;
