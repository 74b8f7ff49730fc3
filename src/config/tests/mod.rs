//! Unit tests for config module
//!
//! Tests store options and application config file resolution.

#![allow(clippy::unwrap_used)]

use std::fs;

use tempfile::TempDir;

use crate::config::{AppConfigLocator, DEFAULT_STORE_NAME, StoreOptions};

#[test]
fn store_options_defaults() {
    let options = StoreOptions::new("app.yml");

    assert!(!options.watch_fs);
    assert_eq!(options.name, None);
    assert_eq!(options.display_name(), DEFAULT_STORE_NAME);
}

#[test]
fn store_options_builder() {
    let options = StoreOptions::new("app.yml").watch(true).named("billing");

    assert!(options.watch_fs);
    assert_eq!(options.display_name(), "billing");
}

#[test]
fn store_options_deserialize_with_defaults() {
    let options: StoreOptions = serde_yaml::from_str("config_file: /etc/app.yml\n").unwrap();

    assert_eq!(options, StoreOptions::new("/etc/app.yml"));
}

#[test]
fn store_options_deserialize_all_keys() {
    let options: StoreOptions =
        serde_yaml::from_str("config_file: app.yml\nwatch_fs: true\nname: primary\n").unwrap();

    assert_eq!(options, StoreOptions::new("app.yml").watch(true).named("primary"));
}

#[test]
fn store_options_require_config_file() {
    let result: Result<StoreOptions, _> = serde_yaml::from_str("watch_fs: true\n");

    assert!(result.is_err());
}

#[test]
fn locator_derives_root_env_from_app_name() {
    let locator = AppConfigLocator::new("my-app");

    assert_eq!(locator.root_env_var(), "MY_APP_ROOT");
    assert_eq!(locator.app_name(), "my-app");
}

#[test]
fn locator_prefers_file_under_env_root() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("shop.yml"), "a: 1\n").unwrap();

    let bundled = root.path().join("bundled.yml");
    let locator = AppConfigLocator::new("shop")
        .root_env("CONFKEEPER_TEST_SHOP_ROOT")
        .bundled(&bundled);

    temp_env::with_var("CONFKEEPER_TEST_SHOP_ROOT", Some(root.path()), || {
        assert_eq!(locator.resolve(), config_dir.join("shop.yml"));
    });
}

#[test]
fn locator_falls_back_to_bundled_file() {
    let root = TempDir::new().unwrap();
    let bundled = root.path().join("bundled.yml");
    fs::write(&bundled, "a: 1\n").unwrap();

    let locator = AppConfigLocator::new("shop")
        .root_env("CONFKEEPER_TEST_FALLBACK_ROOT")
        .bundled(&bundled);

    temp_env::with_var("CONFKEEPER_TEST_FALLBACK_ROOT", Some(root.path()), || {
        assert_eq!(locator.resolve(), bundled);
    });
}

#[test]
fn locator_without_bundled_returns_missing_candidate() {
    let root = TempDir::new().unwrap();
    let locator = AppConfigLocator::new("shop").root_env("CONFKEEPER_TEST_NOBUNDLE_ROOT");

    temp_env::with_var("CONFKEEPER_TEST_NOBUNDLE_ROOT", Some(root.path()), || {
        assert_eq!(
            locator.resolve(),
            root.path().join("config").join("shop.yml")
        );
    });
}

#[test]
fn store_options_for_app_use_app_name() {
    let root = TempDir::new().unwrap();
    let bundled = root.path().join("bundled.yml");
    let locator = AppConfigLocator::new("shop")
        .root_env("CONFKEEPER_TEST_FOR_APP_ROOT")
        .bundled(&bundled);

    temp_env::with_var("CONFKEEPER_TEST_FOR_APP_ROOT", Some(root.path()), || {
        let options = StoreOptions::for_app(&locator);

        assert_eq!(options.config_file, bundled);
        assert_eq!(options.display_name(), "shop");
        assert!(!options.watch_fs);
    });
}
