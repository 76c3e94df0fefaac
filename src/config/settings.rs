use std::time::Duration;

use serde::Deserialize;

use crate::broker::delivery::DeliveryPolicy;

/// Top-level configuration settings for an embedding application.
///
/// Includes settings for the broker and for logging.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    pub broker: BrokerSettings,
    pub log: LogSettings,
}

/// How a publish treats a full bounded mailbox.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    #[default]
    Drop,
    Wait,
}

/// Configuration settings for the broker.
///
/// Controls the mailbox capacity handed to new subscribers and what a
/// publish does when a mailbox is full.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    /// `0` means unbounded.
    pub default_mailbox_capacity: usize,
    pub delivery: DeliveryMode,
    /// Only used with `DeliveryMode::Wait`.
    pub delivery_timeout_ms: u64,
}

impl BrokerSettings {
    pub fn delivery_policy(&self) -> DeliveryPolicy {
        match self.delivery {
            DeliveryMode::Drop => DeliveryPolicy::DropOnFull,
            DeliveryMode::Wait => {
                DeliveryPolicy::Wait(Duration::from_millis(self.delivery_timeout_ms))
            }
        }
    }
}

/// Configuration settings for logging.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub broker: Option<PartialBrokerSettings>,
    pub log: Option<PartialLogSettings>,
}

/// Partial broker settings.
#[derive(Debug, Deserialize, Default)]
pub struct PartialBrokerSettings {
    pub default_mailbox_capacity: Option<usize>,
    pub delivery: Option<DeliveryMode>,
    pub delivery_timeout_ms: Option<u64>,
}

/// Partial log settings.
#[derive(Debug, Deserialize, Default)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            default_mailbox_capacity: 1024,
            delivery: DeliveryMode::Drop,
            delivery_timeout_ms: 100,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Provides default values for `Settings`.
///
/// Ensures the application has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        Self {
            broker: BrokerSettings::default(),
            log: LogSettings::default(),
        }
    }
}

impl PartialSettings {
    /// Fills every missing value from `Settings::default()`.
    pub fn merge_with_defaults(self) -> Settings {
        let default = Settings::default();
        let broker = self.broker.unwrap_or_default();
        let log = self.log.unwrap_or_default();

        Settings {
            broker: BrokerSettings {
                default_mailbox_capacity: broker
                    .default_mailbox_capacity
                    .unwrap_or(default.broker.default_mailbox_capacity),
                delivery: broker.delivery.unwrap_or(default.broker.delivery),
                delivery_timeout_ms: broker
                    .delivery_timeout_ms
                    .unwrap_or(default.broker.delivery_timeout_ms),
            },
            log: LogSettings {
                level: log.level.unwrap_or(default.log.level),
            },
        }
    }
}
