// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for driving the routing hub end to end.
//!
//! `HubHarness` assembles a hub with a capture archive sink and lets tests
//! register mock agent/adapter connections, inject inbound events, and
//! observe outbound events and archived conversations.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use parley_core::event::InboundEvent;
use parley_core::types::{AgentId, ChannelKind, ConnectionId, TenantId};
use parley_hub::dispatch::{ConnectionInfo, ConnectionRole, Dispatcher};
use parley_hub::hub::RoutingHub;
use parley_hub::tenant::TenantSnapshot;

use crate::capture_sink::CaptureArchiveSink;
use crate::mock_connection::MockConnection;

const OUTBOUND_BUFFER: usize = 64;

/// A complete hub test environment.
pub struct HubHarness {
    pub hub: Arc<RoutingHub>,
    pub archive: Arc<CaptureArchiveSink>,
    cancel: CancellationToken,
}

impl Default for HubHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl HubHarness {
    pub fn new() -> Self {
        let archive = CaptureArchiveSink::new();
        let cancel = CancellationToken::new();
        let hub = Arc::new(RoutingHub::new(
            Arc::new(Dispatcher::new()),
            archive.clone(),
            64,
            cancel.clone(),
        ));
        Self {
            hub,
            archive,
            cancel,
        }
    }

    /// Register a mock agent connection for a tenant. The connection is not
    /// listening until the test sends `agent-listening`.
    pub fn connect_agent(&self, tenant: &str, agent: &str) -> MockConnection {
        let info = ConnectionInfo {
            tenant_id: TenantId(tenant.to_string()),
            role: ConnectionRole::Agent {
                agent_id: AgentId(agent.to_string()),
            },
        };
        self.register(info)
    }

    /// Register a mock channel adapter connection for a tenant.
    pub fn connect_adapter(&self, tenant: &str, channel: ChannelKind) -> MockConnection {
        let info = ConnectionInfo {
            tenant_id: TenantId(tenant.to_string()),
            role: ConnectionRole::Adapter { channel },
        };
        self.register(info)
    }

    fn register(&self, info: ConnectionInfo) -> MockConnection {
        let connection_id = ConnectionId::generate();
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        self.hub.register_connection(connection_id.clone(), info, tx);
        MockConnection::new(connection_id, rx)
    }

    /// Inject an inbound event as if it arrived on the given connection.
    pub async fn send(&self, connection: &MockConnection, event: InboundEvent) {
        self.hub.handle_event(&connection.connection_id, event).await;
    }

    /// Simulate the connection's transport closing.
    pub async fn disconnect(&self, connection: &MockConnection) {
        self.hub.connection_closed(&connection.connection_id).await;
    }

    /// Barrier: returns once the tenant actor has processed everything
    /// enqueued before this call, along with its current counts.
    ///
    /// Relies on the actor's strictly sequential mailbox -- the snapshot
    /// command cannot be answered before earlier commands complete.
    pub async fn flush(&self, tenant: &str) -> Option<TenantSnapshot> {
        self.hub.tenant_snapshot(&TenantId(tenant.to_string())).await
    }
}

impl Drop for HubHarness {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
