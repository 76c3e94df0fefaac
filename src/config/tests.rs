use std::env;
use std::fs;
use std::time::Duration;

use serial_test::serial;
use tempfile::TempDir;

use super::settings::{PartialBrokerSettings, PartialSettings};
use super::{BrokerSettings, DeliveryMode, Settings, load_config};
use crate::broker::delivery::DeliveryPolicy;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.broker.default_mailbox_capacity, 1024);
    assert_eq!(settings.broker.delivery, DeliveryMode::Drop);
    assert_eq!(settings.broker.delivery_timeout_ms, 100);
    assert_eq!(settings.log.level, "info");
}

#[test]
fn test_delivery_policy_from_settings() {
    let mut settings = BrokerSettings::default();
    assert_eq!(settings.delivery_policy(), DeliveryPolicy::DropOnFull);

    settings.delivery = DeliveryMode::Wait;
    settings.delivery_timeout_ms = 40;
    assert_eq!(
        settings.delivery_policy(),
        DeliveryPolicy::Wait(Duration::from_millis(40))
    );
}

#[test]
fn test_partial_settings_merge() {
    let partial = PartialSettings {
        broker: Some(PartialBrokerSettings {
            default_mailbox_capacity: Some(8),
            ..Default::default()
        }),
        log: None,
    };

    let settings = partial.merge_with_defaults();
    assert_eq!(settings.broker.default_mailbox_capacity, 8);
    assert_eq!(settings.broker.delivery, DeliveryMode::Drop);
    assert_eq!(settings.log.level, "info");
}

/// Runs `f` with a fresh temporary directory as the working directory.
fn in_temp_dir<F: FnOnce()>(f: F) {
    let tmp = TempDir::new().expect("create tempdir");
    let orig = env::current_dir().expect("current_dir");
    env::set_current_dir(tmp.path()).expect("set current dir");
    f();
    env::set_current_dir(orig).expect("restore cwd");
}

#[test]
#[serial]
fn load_config_without_sources_uses_defaults() {
    in_temp_dir(|| {
        let cfg = load_config().expect("load_config failed");
        assert_eq!(cfg, Settings::default());
    });
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    in_temp_dir(|| {
        fs::create_dir_all("config").expect("create config dir");
        let toml = r#"
            [broker]
            default_mailbox_capacity = 16
            delivery = "wait"

            [log]
            level = "debug"
        "#;
        fs::write("config/default.toml", toml).expect("write config file");

        let cfg = load_config().expect("load_config failed");
        assert_eq!(cfg.broker.default_mailbox_capacity, 16);
        assert_eq!(cfg.broker.delivery, DeliveryMode::Wait);
        assert_eq!(cfg.broker.delivery_timeout_ms, 100);
        assert_eq!(cfg.log.level, "debug");
    });
}

#[test]
#[serial]
fn load_config_env_overrides_file() {
    in_temp_dir(|| {
        fs::create_dir_all("config").expect("create config dir");
        fs::write(
            "config/default.toml",
            "[broker]\ndefault_mailbox_capacity = 16\n",
        )
        .expect("write config file");

        temp_env::with_vars(
            [
                ("POPSUB__BROKER__DEFAULT_MAILBOX_CAPACITY", Some("0")),
                ("POPSUB__BROKER__DELIVERY_TIMEOUT_MS", Some("250")),
                ("POPSUB__LOG__LEVEL", Some("warn")),
            ],
            || {
                let cfg = load_config().expect("load_config failed");
                assert_eq!(cfg.broker.default_mailbox_capacity, 0);
                assert_eq!(cfg.broker.delivery_timeout_ms, 250);
                assert_eq!(cfg.log.level, "warn");
            },
        );
    });
}

#[test]
#[serial]
fn load_config_reads_dotenv() {
    in_temp_dir(|| {
        fs::write(".env", "POPSUB__BROKER__DELIVERY=wait\n").expect("write .env");

        // Restores the variable dotenvy sets for the whole process.
        temp_env::with_var_unset("POPSUB__BROKER__DELIVERY", || {
            let cfg = load_config().expect("load_config failed");
            assert_eq!(cfg.broker.delivery, DeliveryMode::Wait);
        });
    });
}
