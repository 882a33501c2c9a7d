//! Config and preference file tests.
//!
//! These tests verify that configuration files are read with the expected
//! defaults and that the remember preference survives being written to disk
//! and read back.

use askpass_core::config::{Config, LogLevel};
use askpass_core::{Preferences, SettingStore, USE_KEYCHAIN};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_config_empty_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json5");
    std::fs::write(&path, "{}").unwrap();

    let loaded = Config::load(&path).unwrap();
    let defaults = Config::default();
    assert_eq!(loaded.keychain.enabled, defaults.keychain.enabled);
    assert_eq!(loaded.logging.level, defaults.logging.level);
    assert!(loaded.logging.file.is_none());
}

#[test]
fn test_config_log_file_is_read() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json5");
    std::fs::write(
        &path,
        r#"{ logging: { level: "debug", file: "/tmp/askpass.log" } }"#,
    )
    .unwrap();

    let loaded = Config::load(&path).unwrap();
    assert!(loaded.keychain.enabled);
    assert_eq!(loaded.logging.level, LogLevel::Debug);
    assert_eq!(loaded.logging.file, Some(PathBuf::from("/tmp/askpass.log")));
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_config_handwritten_json5() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json5");
    std::fs::write(
        &path,
        r#"{
            // keep passphrases out of the keychain on this machine
            keychain: { enabled: false },
            logging: { level: 'info', },
        }"#,
    )
    .unwrap();

    let loaded = Config::load(&path).unwrap();
    assert!(!loaded.keychain.enabled);
    assert_eq!(loaded.logging.level, LogLevel::Info);
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/config.json5"));
    assert!(result.is_err());

    let config = Config::load_or_default(Some(Path::new("/nonexistent/config.json5"))).unwrap();
    assert!(config.keychain.enabled);
}

#[test]
fn test_config_parse_invalid() {
    let result = Config::parse("not valid json");
    assert!(result.is_err());
}

#[test]
fn test_preferences_persist_across_opens() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("preferences.json");

    let mut prefs = Preferences::open(&path);
    assert_eq!(prefs.get_bool(USE_KEYCHAIN), None);
    prefs.set_bool(USE_KEYCHAIN, true).unwrap();

    let reopened = Preferences::open(&path);
    assert_eq!(reopened.get_bool(USE_KEYCHAIN), Some(true));

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["useKeychain"], true);
}

#[test]
fn test_preferences_keep_unknown_keys() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("preferences.json");
    std::fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

    let mut prefs = Preferences::open(&path);
    prefs.set_bool(USE_KEYCHAIN, false).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["theme"], "dark");
    assert_eq!(raw["useKeychain"], false);
}
