//! Loading configuration files.

use std::{io::Write, sync::Arc};

use firetree::{Client, Store, config::Config, remote::InMemory};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write config");
    file
}

#[test]
fn test_load_valid_file() {
    let file = write_config(
        r#"{
            "apiKey": "key",
            "authDomain": "demo.test",
            "databaseURL": "memory://demo",
            "userProfile": "users",
            "enableLogging": true
        }"#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.database_url, "memory://demo");
    assert!(config.enable_logging);
    assert_eq!(config.profile_path("u1").as_deref(), Some("users/u1"));
}

#[test]
fn test_load_reports_first_missing_field() {
    let file = write_config(r#"{"apiKey": "key"}"#);
    let err = Config::load(file.path()).unwrap_err();
    assert!(err.is_missing_field());
    assert_eq!(err.to_string(), "Remote store databaseURL is required");
}

#[test]
fn test_load_rejects_malformed_json() {
    let file = write_config("{not json");
    let err = Config::load(file.path()).unwrap_err();
    assert!(!err.is_missing_field());
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load(dir.path().join("absent.json")).is_err());
}

#[test]
fn test_client_rejects_incomplete_config() {
    let config = Config {
        database_url: "memory://demo".to_string(),
        ..Default::default()
    };
    let err = Client::new(
        config,
        Arc::new(InMemory::new()),
        Arc::new(Store::new()),
    )
    .unwrap_err();
    assert!(err.is_config_error());
}
