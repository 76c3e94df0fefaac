mod settings;

use config::{Config, ConfigError, Environment, File};

use crate::config::settings::PartialSettings;

pub use settings::{BrokerSettings, DeliveryMode, LogSettings, Settings};

/// Prefix of the environment variables read by [`load_config`].
pub const ENV_PREFIX: &str = "POPSUB";

/// Loads the configuration of an embedding application.
///
/// Sources, later ones overriding earlier ones:
/// - a `.env` file in the working directory, if any
/// - `config/default.{toml,json,yaml,...}`, if any
/// - `POPSUB__<SECTION>__<KEY>` environment variables, e.g.
///   `POPSUB__BROKER__DELIVERY=wait`
///
/// Values missing from every source fall back to `Settings::default()`.
pub fn load_config() -> Result<Settings, ConfigError> {
    let _ = dotenvy::dotenv();

    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available, then merge with defaults
    let partial: PartialSettings = config.try_deserialize()?;
    Ok(partial.merge_with_defaults())
}

#[cfg(test)]
mod tests;
