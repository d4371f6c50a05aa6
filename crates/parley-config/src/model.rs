// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Parley routing hub.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, producing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Parley configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    /// Routing hub behavior settings.
    #[serde(default)]
    pub hub: HubConfig,

    /// HTTP/WebSocket gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Conversation archival settings.
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Metrics exporter settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Routing hub behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HubConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Bounded capacity of each per-tenant command mailbox.
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            mailbox_capacity: default_mailbox_capacity(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_mailbox_capacity() -> usize {
    256
}

/// HTTP/WebSocket gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required during the WebSocket handshake.
    /// `None` means no token is configured and every upgrade is rejected.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

/// Conversation archival configuration.
///
/// When `endpoint` is unset, ended conversations are logged instead of
/// delivered, which is the development default.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    /// HTTP endpoint of the external persistence collaborator.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Per-attempt request timeout in seconds.
    #[serde(default = "default_archive_timeout_secs")]
    pub timeout_secs: u64,

    /// Delivery attempts before giving up on a conversation.
    #[serde(default = "default_archive_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff between attempts in milliseconds (doubles per attempt).
    #[serde(default = "default_archive_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_archive_timeout_secs(),
            max_attempts: default_archive_max_attempts(),
            backoff_ms: default_archive_backoff_ms(),
        }
    }
}

fn default_archive_timeout_secs() -> u64 {
    10
}

fn default_archive_max_attempts() -> u32 {
    3
}

fn default_archive_backoff_ms() -> u64 {
    500
}

/// Metrics exporter configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder and serve `GET /metrics`.
    #[serde(default)]
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = ParleyConfig::default();
        assert_eq!(config.hub.log_level, "info");
        assert_eq!(config.hub.mailbox_capacity, 256);
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.gateway.port, 8090);
        assert!(config.gateway.bearer_token.is_none());
        assert!(config.archive.endpoint.is_none());
        assert_eq!(config.archive.max_attempts, 3);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn unknown_top_level_section_is_rejected() {
        let toml_str = r#"
[broker]
enabled = true
"#;
        assert!(toml::from_str::<ParleyConfig>(toml_str).is_err());
    }

    #[test]
    fn unknown_field_in_gateway_is_rejected() {
        let toml_str = r#"
[gateway]
hosname = "0.0.0.0"
"#;
        assert!(toml::from_str::<ParleyConfig>(toml_str).is_err());
    }
}
