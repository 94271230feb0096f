//! Unit tests for bootstrap configuration
//!
//! Tests:
//! - Priority order: overrides > TOML file > compiled defaults
//! - Missing default config file is not an error
//! - Explicitly named but unreadable/invalid config file is an error

use sevs_common::config::{
    load_toml_config, parse_toml_config, ConfigOverrides, DuplicateScope, ServiceConfig,
    TomlConfig, DEFAULT_PORT, DEFAULT_TOKEN_TTL_HOURS,
};
use sevs_common::Error;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_defaults_when_nothing_configured() {
    let config = ServiceConfig::resolve(ConfigOverrides::default(), TomlConfig::default()).unwrap();

    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.token_ttl_hours, DEFAULT_TOKEN_TTL_HOURS);
    assert_eq!(config.duplicate_scope, DuplicateScope::Ever);
    assert_eq!(config.log_level, "info");
    assert!(config.jwt_secret.is_none());
    assert!(config.allows_any_origin());
    assert!(config.database_path.ends_with("sevs.db"));
}

#[test]
fn test_toml_values_applied() {
    let file = parse_toml_config(
        r#"
        database_path = "/srv/sevs/entry.db"
        port = 8080
        bind_address = "127.0.0.1"
        allowed_origins = ["https://checkin.example.org"]
        jwt_secret = "file-secret"
        token_ttl_hours = 12
        duplicate_scope = "day"
        pool_max_connections = 4
        acquire_timeout_ms = 750

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    let config = ServiceConfig::resolve(ConfigOverrides::default(), file).unwrap();

    assert_eq!(config.database_path, PathBuf::from("/srv/sevs/entry.db"));
    assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
    assert_eq!(config.allowed_origins, vec!["https://checkin.example.org"]);
    assert!(!config.allows_any_origin());
    assert_eq!(config.jwt_secret.as_deref(), Some("file-secret"));
    assert_eq!(config.token_ttl_hours, 12);
    assert_eq!(config.duplicate_scope, DuplicateScope::Day);
    assert_eq!(config.pool.max_connections, 4);
    assert_eq!(config.pool.acquire_timeout, Duration::from_millis(750));
    assert_eq!(config.log_level, "debug");
}

#[test]
fn test_overrides_beat_toml() {
    let file = TomlConfig {
        port: Some(8080),
        jwt_secret: Some("file-secret".to_string()),
        duplicate_scope: Some(DuplicateScope::Day),
        allowed_origins: vec!["https://file.example".to_string()],
        ..Default::default()
    };
    let overrides = ConfigOverrides {
        port: Some(9090),
        jwt_secret: Some("env-secret".to_string()),
        duplicate_scope: Some(DuplicateScope::Ever),
        allowed_origins: Some(vec!["*".to_string()]),
        ..Default::default()
    };

    let config = ServiceConfig::resolve(overrides, file).unwrap();

    assert_eq!(config.port, 9090);
    assert_eq!(config.jwt_secret.as_deref(), Some("env-secret"));
    assert_eq!(config.duplicate_scope, DuplicateScope::Ever);
    assert!(config.allows_any_origin());
}

#[test]
fn test_zero_token_ttl_rejected() {
    let overrides = ConfigOverrides {
        token_ttl_hours: Some(0),
        ..Default::default()
    };
    let result = ServiceConfig::resolve(overrides, TomlConfig::default());
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_unknown_duplicate_scope_in_toml_rejected() {
    assert!(parse_toml_config(r#"duplicate_scope = "weekly""#).is_err());
}

#[test]
fn test_explicit_missing_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    let result = load_toml_config(Some(&missing));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_explicit_file_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sevs.toml");
    std::fs::write(&path, "port = 5000\n").unwrap();

    let file = load_toml_config(Some(&path)).unwrap();
    assert_eq!(file.port, Some(5000));
}

#[test]
fn test_explicit_invalid_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "port = \"not a number\"\n").unwrap();

    let result = load_toml_config(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));
}
