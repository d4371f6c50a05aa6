// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presence registry: which agent connections are currently able to
//! receive work.
//!
//! One record per live connection. An agent with multiple tabs holds
//! multiple records, each tracked independently. Owned by the tenant actor;
//! never shared.

use chrono::Utc;

use parley_core::types::{AgentId, AgentPresence, ConnectionId, TenantId};

/// In-memory registry of online agent connections for one tenant.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    online: std::collections::HashMap<ConnectionId, AgentPresence>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection as listening. Idempotent: a re-register for the
    /// same connection overwrites any stale entry.
    pub fn register(&mut self, connection_id: ConnectionId, agent_id: AgentId, tenant_id: TenantId) {
        let presence = AgentPresence {
            connection_id: connection_id.clone(),
            agent_id,
            tenant_id,
            connected_at: Utc::now(),
        };
        self.online.insert(connection_id, presence);
    }

    /// Remove a connection's presence entry, returning the removed record so
    /// the hub can react to the disconnect. Absence is a valid, silent state.
    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<AgentPresence> {
        self.online.remove(connection_id)
    }

    /// All current presences for the tenant.
    pub fn list_online(&self) -> impl Iterator<Item = &AgentPresence> {
        self.online.values()
    }

    pub fn is_online(&self, connection_id: &ConnectionId) -> bool {
        self.online.contains_key(connection_id)
    }

    pub fn len(&self) -> usize {
        self.online.len()
    }

    pub fn is_empty(&self) -> bool {
        self.online.is_empty()
    }
}
