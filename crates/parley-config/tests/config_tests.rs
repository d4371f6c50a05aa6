// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Parley configuration system.

use parley_config::diagnostic::{suggest_key, ConfigError};
use parley_config::{load_and_validate_str, load_config_from_path, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_parley_config() {
    let toml = r#"
[hub]
log_level = "debug"
mailbox_capacity = 128

[gateway]
host = "0.0.0.0"
port = 9000
bearer_token = "hub-secret"

[archive]
endpoint = "https://archive.internal/conversations"
timeout_secs = 5
max_attempts = 5
backoff_ms = 250

[metrics]
enabled = true
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.hub.log_level, "debug");
    assert_eq!(config.hub.mailbox_capacity, 128);
    assert_eq!(config.gateway.host, "0.0.0.0");
    assert_eq!(config.gateway.port, 9000);
    assert_eq!(config.gateway.bearer_token.as_deref(), Some("hub-secret"));
    assert_eq!(
        config.archive.endpoint.as_deref(),
        Some("https://archive.internal/conversations")
    );
    assert_eq!(config.archive.timeout_secs, 5);
    assert_eq!(config.archive.max_attempts, 5);
    assert_eq!(config.archive.backoff_ms, 250);
    assert!(config.metrics.enabled);
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.hub.log_level, "info");
    assert_eq!(config.hub.mailbox_capacity, 256);
    assert_eq!(config.gateway.host, "127.0.0.1");
    assert_eq!(config.gateway.port, 8090);
    assert!(config.gateway.bearer_token.is_none());
    assert!(config.archive.endpoint.is_none());
    assert!(!config.metrics.enabled);
}

/// Unknown field in [gateway] section produces an error.
#[test]
fn unknown_field_in_gateway_produces_error() {
    let toml = r#"
[gateway]
hots = "0.0.0.0"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    // Figment wraps serde's deny_unknown_fields error
    assert!(
        err_str.contains("unknown field") || err_str.contains("hots"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// The diagnostic layer suggests the intended key for a near-miss typo.
#[test]
fn typo_in_gateway_key_gets_suggestion() {
    let errors = load_and_validate_str(
        r#"
[gateway]
beaer_token = "secret"
"#,
    )
    .expect_err("should reject unknown field");

    let has_suggestion = errors.iter().any(|e| {
        matches!(
            e,
            ConfigError::UnknownKey {
                suggestion: Some(s),
                ..
            } if s == "bearer_token"
        )
    });
    assert!(has_suggestion, "expected bearer_token suggestion, got: {errors:?}");
}

/// Validation errors surface through load_and_validate_str.
#[test]
fn semantic_validation_runs_after_deserialization() {
    let errors = load_and_validate_str(
        r#"
[hub]
log_level = "shout"
"#,
    )
    .expect_err("bogus log level should fail validation");

    assert!(errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { message } if message.contains("log_level"))
    }));
}

/// Wrong value type produces an invalid-type diagnostic, not a panic.
#[test]
fn wrong_type_for_port_produces_error() {
    let errors = load_and_validate_str(
        r#"
[gateway]
port = "eight thousand"
"#,
    )
    .expect_err("string port should be rejected");
    assert!(!errors.is_empty());
}

/// suggest_key is exercised directly with hub section keys.
#[test]
fn suggest_key_finds_close_match() {
    let valid = &["log_level", "mailbox_capacity"];
    assert_eq!(
        suggest_key("mailbox_capcity", valid),
        Some("mailbox_capacity".to_string())
    );
    assert_eq!(suggest_key("totally_different", valid), None);
}

/// Environment variables override file values via the PARLEY_ prefix.
#[test]
#[serial_test::serial]
fn env_var_overrides_file_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parley.toml");
    std::fs::write(&path, "[gateway]\nport = 9000\n").unwrap();

    // SAFETY: serialized via serial_test; no other thread touches env here.
    unsafe { std::env::set_var("PARLEY_GATEWAY_PORT", "9100") };
    let config = load_config_from_path(&path).expect("config should load");
    unsafe { std::env::remove_var("PARLEY_GATEWAY_PORT") };

    assert_eq!(config.gateway.port, 9100);
}

/// Underscore-containing keys map correctly (PARLEY_GATEWAY_BEARER_TOKEN
/// must become gateway.bearer_token, not gateway.bearer.token).
#[test]
#[serial_test::serial]
fn env_var_with_underscores_maps_to_correct_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parley.toml");
    std::fs::write(&path, "").unwrap();

    unsafe { std::env::set_var("PARLEY_GATEWAY_BEARER_TOKEN", "env-secret") };
    let config = load_config_from_path(&path).expect("config should load");
    unsafe { std::env::remove_var("PARLEY_GATEWAY_BEARER_TOKEN") };

    assert_eq!(config.gateway.bearer_token.as_deref(), Some("env-secret"));
}
