// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parley routing hub.
//!
//! None of these are fatal to the hub process; each is handled at the single
//! event that caused it. The first four variants map to stable wire codes
//! carried by outbound `error` events.

use thiserror::Error;

/// The primary error type used across the Parley workspace.
#[derive(Debug, Error)]
pub enum HubError {
    /// Missing or malformed required field on an inbound event. Rejected
    /// locally, sender notified, no state change.
    #[error("invalid event: missing or empty field `{field}`")]
    Validation { field: &'static str },

    /// Claim attempt on an already-claimed or absent request. Rejected,
    /// sender notified, queue unaffected.
    #[error("{reason}")]
    Conflict { reason: String },

    /// Operation referencing an unknown conversation or user. Logged and
    /// ignored: messages may legitimately arrive after a conversation ends
    /// due to transport latency.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// An operation's tenant does not match the authenticated connection's
    /// tenant. Treated as a security event; the request is dropped but the
    /// connection is kept.
    #[error("event tenant `{event_tenant}` does not match connection tenant `{connection_tenant}`")]
    TenantMismatch {
        event_tenant: String,
        connection_tenant: String,
    },

    /// Configuration errors (invalid TOML, bad values, missing settings).
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-layer errors (bind failure, socket errors, codec failures).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Archival delivery errors from the external persistence collaborator.
    #[error("archive error: {message}")]
    Archive {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl HubError {
    /// Stable wire code for this error, carried in outbound `error` events.
    pub fn code(&self) -> &'static str {
        match self {
            HubError::Validation { .. } => "validation",
            HubError::Conflict { .. } => "conflict",
            HubError::NotFound { .. } => "not_found",
            HubError::TenantMismatch { .. } => "tenant_mismatch",
            HubError::Config(_) => "config",
            HubError::Transport { .. } => "transport",
            HubError::Archive { .. } => "archive",
        }
    }
}
