// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses, known log levels, and sane
//! archival retry parameters.

use crate::diagnostic::ConfigError;
use crate::model::ParleyConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate log_level is a known level
    if !LOG_LEVELS.contains(&config.hub.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "hub.log_level must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                config.hub.log_level
            ),
        });
    }

    // Validate mailbox capacity is usable
    if config.hub.mailbox_capacity == 0 {
        errors.push(ConfigError::Validation {
            message: "hub.mailbox_capacity must be at least 1".to_string(),
        });
    }

    // Validate gateway.host is not empty
    if config.gateway.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    }

    // Validate gateway.host looks like a valid IP or hostname
    if !config.gateway.host.trim().is_empty() {
        let addr = config.gateway.host.trim();
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!(
                    "gateway.host `{addr}` is not a valid IP address or hostname"
                ),
            });
        }
    }

    if config.gateway.port == 0 {
        errors.push(ConfigError::Validation {
            message: "gateway.port must not be 0".to_string(),
        });
    }

    // Validate archive endpoint is an http(s) URL when set
    if let Some(ref endpoint) = config.archive.endpoint
        && !endpoint.starts_with("http://")
        && !endpoint.starts_with("https://")
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "archive.endpoint must be an http:// or https:// URL, got `{endpoint}`"
            ),
        });
    }

    if config.archive.max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "archive.max_attempts must be at least 1".to_string(),
        });
    }

    if config.archive.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "archive.timeout_secs must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = ParleyConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn bogus_log_level_fails_validation() {
        let mut config = ParleyConfig::default();
        config.hub.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("log_level"))));
    }

    #[test]
    fn empty_host_fails_validation() {
        let mut config = ParleyConfig::default();
        config.gateway.host = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("gateway.host"))));
    }

    #[test]
    fn zero_port_fails_validation() {
        let mut config = ParleyConfig::default();
        config.gateway.port = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("gateway.port"))));
    }

    #[test]
    fn non_http_archive_endpoint_fails_validation() {
        let mut config = ParleyConfig::default();
        config.archive.endpoint = Some("ftp://archive.internal".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("archive.endpoint"))));
    }

    #[test]
    fn https_archive_endpoint_passes() {
        let mut config = ParleyConfig::default();
        config.archive.endpoint = Some("https://archive.internal/conversations".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_mailbox_capacity_fails_validation() {
        let mut config = ParleyConfig::default();
        config.hub.mailbox_capacity = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("mailbox_capacity"))));
    }

    #[test]
    fn multiple_errors_are_collected() {
        let mut config = ParleyConfig::default();
        config.hub.log_level = "loud".to_string();
        config.gateway.port = 0;
        config.archive.max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
