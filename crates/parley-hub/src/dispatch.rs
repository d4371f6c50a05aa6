// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection registry and outbound event dispatch.
//!
//! Maps every live connection id to the mpsc sender feeding its transport
//! writer. Adapters are additionally indexed by `(tenant, channel)` so
//! agent replies can be routed back to the originating adapter without a
//! scan. Shared between the gateway (register/remove) and the tenant actors
//! (send).

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use parley_core::event::OutboundEvent;
use parley_core::types::{AgentId, ChannelKind, ConnectionId, TenantId};

/// What an authenticated connection represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionRole {
    /// A human agent's client (one connection per tab).
    Agent { agent_id: AgentId },
    /// A channel adapter instance serving one channel for one tenant.
    Adapter { channel: ChannelKind },
}

/// Authenticated identity of one live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub tenant_id: TenantId,
    pub role: ConnectionRole,
}

struct ConnectionEntry {
    info: ConnectionInfo,
    tx: mpsc::Sender<OutboundEvent>,
}

/// Registry of live connections and their outbound senders.
#[derive(Default)]
pub struct Dispatcher {
    connections: DashMap<ConnectionId, ConnectionEntry>,
    adapters: DashMap<(TenantId, ChannelKind), ConnectionId>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. An adapter connection replaces any previous
    /// adapter registered for the same `(tenant, channel)`.
    pub fn register(
        &self,
        connection_id: ConnectionId,
        info: ConnectionInfo,
        tx: mpsc::Sender<OutboundEvent>,
    ) {
        if let ConnectionRole::Adapter { channel } = info.role {
            self.adapters
                .insert((info.tenant_id.clone(), channel), connection_id.clone());
        }
        self.connections
            .insert(connection_id, ConnectionEntry { info, tx });
    }

    /// Remove a connection, returning its identity so the hub can react.
    pub fn remove(&self, connection_id: &ConnectionId) -> Option<ConnectionInfo> {
        let (_, entry) = self.connections.remove(connection_id)?;
        if let ConnectionRole::Adapter { channel } = entry.info.role {
            // Only drop the index entry if it still points at this connection;
            // a replacement adapter may have registered in the meantime.
            let key = (entry.info.tenant_id.clone(), channel);
            self.adapters
                .remove_if(&key, |_, current| current == connection_id);
        }
        Some(entry.info)
    }

    /// The authenticated identity of a connection, if it is still live.
    pub fn info(&self, connection_id: &ConnectionId) -> Option<ConnectionInfo> {
        self.connections
            .get(connection_id)
            .map(|entry| entry.info.clone())
    }

    /// Send an event to a specific connection.
    ///
    /// Uses `try_send` so a slow consumer can never stall a tenant actor;
    /// a full or closed buffer drops the event with a warning.
    pub fn send(&self, connection_id: &ConnectionId, event: OutboundEvent) {
        let Some(entry) = self.connections.get(connection_id) else {
            debug!(connection = %connection_id, "send to unknown connection dropped");
            return;
        };
        if let Err(err) = entry.tx.try_send(event) {
            warn!(
                connection = %connection_id,
                error = %err,
                "dropping outbound event for connection"
            );
        }
    }

    /// Send an event to the adapter serving `(tenant, channel)`, if one is
    /// connected.
    pub fn send_to_adapter(&self, tenant_id: &TenantId, channel: ChannelKind, event: OutboundEvent) {
        let Some(connection_id) = self
            .adapters
            .get(&(tenant_id.clone(), channel))
            .map(|entry| entry.value().clone())
        else {
            debug!(
                tenant = %tenant_id,
                channel = %channel,
                "no adapter connected for channel, event dropped"
            );
            return;
        };
        self.send(&connection_id, event);
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent_info(tenant: &str, agent: &str) -> ConnectionInfo {
        ConnectionInfo {
            tenant_id: TenantId(tenant.to_string()),
            role: ConnectionRole::Agent {
                agent_id: AgentId(agent.to_string()),
            },
        }
    }

    fn adapter_info(tenant: &str, channel: ChannelKind) -> ConnectionInfo {
        ConnectionInfo {
            tenant_id: TenantId(tenant.to_string()),
            role: ConnectionRole::Adapter { channel },
        }
    }

    fn error_event() -> OutboundEvent {
        OutboundEvent::Error {
            code: "conflict".into(),
            message: "test".into(),
        }
    }

    #[tokio::test]
    async fn send_reaches_registered_connection() {
        let dispatcher = Dispatcher::new();
        let (tx, mut rx) = mpsc::channel(4);
        let id = ConnectionId("c1".into());
        dispatcher.register(id.clone(), agent_info("acme", "a1"), tx);

        dispatcher.send(&id, error_event());
        assert!(matches!(rx.recv().await, Some(OutboundEvent::Error { .. })));
    }

    #[tokio::test]
    async fn send_to_unknown_connection_is_dropped() {
        let dispatcher = Dispatcher::new();
        // Must not panic.
        dispatcher.send(&ConnectionId("ghost".into()), error_event());
    }

    #[tokio::test]
    async fn adapter_index_routes_by_tenant_and_channel() {
        let dispatcher = Dispatcher::new();
        let (tx, mut rx) = mpsc::channel(4);
        let id = ConnectionId("ad1".into());
        dispatcher.register(id, adapter_info("acme", ChannelKind::Web), tx);

        dispatcher.send_to_adapter(
            &TenantId("acme".into()),
            ChannelKind::Web,
            error_event(),
        );
        assert!(rx.recv().await.is_some());

        // Different tenant, same channel: nothing delivered.
        dispatcher.send_to_adapter(
            &TenantId("globex".into()),
            ChannelKind::Web,
            error_event(),
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn remove_returns_identity_and_clears_adapter_index() {
        let dispatcher = Dispatcher::new();
        let (tx, _rx) = mpsc::channel(4);
        let id = ConnectionId("ad1".into());
        dispatcher.register(id.clone(), adapter_info("acme", ChannelKind::Bot), tx);

        let info = dispatcher.remove(&id).expect("should return identity");
        assert_eq!(
            info.role,
            ConnectionRole::Adapter {
                channel: ChannelKind::Bot
            }
        );

        // Index entry is gone: send_to_adapter drops silently.
        dispatcher.send_to_adapter(&TenantId("acme".into()), ChannelKind::Bot, error_event());
        assert_eq!(dispatcher.connection_count(), 0);
    }

    #[tokio::test]
    async fn replacement_adapter_survives_stale_remove() {
        let dispatcher = Dispatcher::new();
        let (tx1, _rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        let old = ConnectionId("ad-old".into());
        let new = ConnectionId("ad-new".into());

        dispatcher.register(old.clone(), adapter_info("acme", ChannelKind::Web), tx1);
        dispatcher.register(new.clone(), adapter_info("acme", ChannelKind::Web), tx2);

        // Removing the stale connection must not unindex the replacement.
        dispatcher.remove(&old);
        dispatcher.send_to_adapter(&TenantId("acme".into()), ChannelKind::Web, error_event());
        assert!(rx2.recv().await.is_some());
    }

    #[tokio::test]
    async fn full_buffer_drops_instead_of_blocking() {
        let dispatcher = Dispatcher::new();
        let (tx, _rx) = mpsc::channel(1);
        let id = ConnectionId("c1".into());
        dispatcher.register(id.clone(), agent_info("acme", "a1"), tx);

        dispatcher.send(&id, error_event());
        // Buffer is now full; this must return without blocking.
        dispatcher.send(&id, error_event());
    }
}
