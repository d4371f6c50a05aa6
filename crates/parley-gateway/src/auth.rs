// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handshake authentication for WebSocket connections.
//!
//! Each connection authenticates once, during the HTTP upgrade, via query
//! parameters: a shared bearer token plus the connection's identity. Agent
//! connections identify `agent_id`/`tenant`; adapter connections identify
//! `tenant`/`channel`. When no token is configured, every upgrade is
//! rejected (fail-closed).

use std::str::FromStr;

use axum::http::StatusCode;
use serde::Deserialize;

use parley_core::types::{AgentId, ChannelKind, TenantId};
use parley_hub::dispatch::{ConnectionInfo, ConnectionRole};

/// Authentication configuration for the gateway.
#[derive(Clone)]
pub struct AuthConfig {
    /// Expected bearer token. `None` means auth is unconfigured and all
    /// connections are rejected.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Query parameters presented during the `/ws` handshake.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub role: String,
    pub tenant: String,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// Validate the handshake and derive the connection's identity.
///
/// Token check first (fail-closed when unconfigured), then identity fields
/// per role.
pub fn authenticate(
    auth: &AuthConfig,
    query: &WsQuery,
) -> Result<ConnectionInfo, (StatusCode, &'static str)> {
    let Some(ref expected) = auth.bearer_token else {
        tracing::error!("gateway has no auth configured -- rejecting connection");
        return Err((StatusCode::UNAUTHORIZED, "authentication not configured"));
    };
    if query.token.as_deref() != Some(expected.as_str()) {
        return Err((StatusCode::UNAUTHORIZED, "invalid token"));
    }

    if query.tenant.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "tenant is required"));
    }
    let tenant_id = TenantId(query.tenant.clone());

    let role = match query.role.as_str() {
        "agent" => {
            let agent_id = query
                .agent_id
                .as_deref()
                .filter(|id| !id.trim().is_empty())
                .ok_or((StatusCode::BAD_REQUEST, "agent_id is required for agents"))?;
            ConnectionRole::Agent {
                agent_id: AgentId(agent_id.to_string()),
            }
        }
        "adapter" => {
            let channel = query
                .channel
                .as_deref()
                .ok_or((StatusCode::BAD_REQUEST, "channel is required for adapters"))?;
            let channel = ChannelKind::from_str(channel)
                .map_err(|_| (StatusCode::BAD_REQUEST, "unknown channel"))?;
            ConnectionRole::Adapter { channel }
        }
        _ => return Err((StatusCode::BAD_REQUEST, "role must be agent or adapter")),
    };

    Ok(ConnectionInfo { tenant_id, role })
}
