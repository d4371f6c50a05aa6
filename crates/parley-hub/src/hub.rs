// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The routing hub front object.
//!
//! Receives inbound events from the gateway, validates them at the boundary,
//! enforces tenant isolation and connection-role rules, and forwards them as
//! commands to the owning tenant's actor. Tenant actors are spawned lazily on
//! the first event for a tenant.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use parley_core::archive::ArchiveSink;
use parley_core::error::HubError;
use parley_core::event::{InboundEvent, OutboundEvent};
use parley_core::types::{ConnectionId, TenantId};

use crate::dispatch::{ConnectionInfo, ConnectionRole, Dispatcher};
use crate::recording;
use crate::tenant::{TenantActor, TenantCommand, TenantSnapshot};

/// Hub-wide counts for health reporting.
#[derive(Debug, Clone, Copy)]
pub struct HubStats {
    pub tenants: usize,
    pub connections: usize,
}

/// The orchestrator owning all tenant actors and the connection registry.
pub struct RoutingHub {
    dispatcher: Arc<Dispatcher>,
    archive: Arc<dyn ArchiveSink>,
    tenants: DashMap<TenantId, mpsc::Sender<TenantCommand>>,
    mailbox_capacity: usize,
    cancel: CancellationToken,
}

impl RoutingHub {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        archive: Arc<dyn ArchiveSink>,
        mailbox_capacity: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            dispatcher,
            archive,
            tenants: DashMap::new(),
            mailbox_capacity,
            cancel,
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Register a freshly authenticated connection and its outbound sender.
    pub fn register_connection(
        &self,
        connection_id: ConnectionId,
        info: ConnectionInfo,
        tx: mpsc::Sender<OutboundEvent>,
    ) {
        self.dispatcher.register(connection_id, info, tx);
        recording::set_connections(self.dispatcher.connection_count() as f64);
    }

    /// Handle a connection closing: unregister it and, for agent
    /// connections, let the tenant actor remove presence and re-enqueue any
    /// conversations the connection held.
    pub async fn connection_closed(&self, connection_id: &ConnectionId) {
        let Some(info) = self.dispatcher.remove(connection_id) else {
            return;
        };
        recording::set_connections(self.dispatcher.connection_count() as f64);

        if matches!(info.role, ConnectionRole::Agent { .. }) {
            let sender = self.tenant_sender(&info.tenant_id);
            let command = TenantCommand::ConnectionClosed {
                connection_id: connection_id.clone(),
            };
            if sender.send(command).await.is_err() {
                warn!(tenant = %info.tenant_id, "tenant mailbox closed during disconnect");
            }
        }
    }

    /// Validate and route one inbound event from a connection.
    ///
    /// Rejections (validation, tenant mismatch, wrong role) reply with a
    /// structured `error` event and never reach tenant state.
    pub async fn handle_event(&self, connection_id: &ConnectionId, event: InboundEvent) {
        let Some(info) = self.dispatcher.info(connection_id) else {
            warn!(connection = %connection_id, "event from unregistered connection dropped");
            return;
        };

        if let Err(err) = event.validate() {
            self.dispatcher
                .send(connection_id, OutboundEvent::error(&err));
            return;
        }

        // Tenant isolation: a payload tenant must match the connection's
        // authenticated tenant. Treated as a security event.
        if let Some(event_tenant) = event.payload_tenant()
            && event_tenant != info.tenant_id.0
        {
            let err = HubError::TenantMismatch {
                event_tenant: event_tenant.to_string(),
                connection_tenant: info.tenant_id.0.clone(),
            };
            warn!(
                connection = %connection_id,
                event_tenant = event_tenant,
                connection_tenant = %info.tenant_id,
                "tenant mismatch on inbound event"
            );
            self.dispatcher
                .send(connection_id, OutboundEvent::error(&err));
            return;
        }

        let command = match command_for(&info, connection_id, event) {
            Ok(command) => command,
            Err(err) => {
                self.dispatcher
                    .send(connection_id, OutboundEvent::error(&err));
                return;
            }
        };

        let sender = self.tenant_sender(&info.tenant_id);
        if sender.send(command).await.is_err() {
            warn!(tenant = %info.tenant_id, "tenant mailbox closed, event dropped");
        }
    }

    /// Point-in-time counts for one tenant. Answered by the actor via
    /// oneshot, so the snapshot is consistent with its serialized state.
    pub async fn tenant_snapshot(&self, tenant_id: &TenantId) -> Option<TenantSnapshot> {
        let sender = self.tenants.get(tenant_id)?.clone();
        let (reply, rx) = oneshot::channel();
        sender.send(TenantCommand::Snapshot { reply }).await.ok()?;
        rx.await.ok()
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            tenants: self.tenants.len(),
            connections: self.dispatcher.connection_count(),
        }
    }

    /// The mailbox for a tenant's actor, spawning it on first use.
    fn tenant_sender(&self, tenant_id: &TenantId) -> mpsc::Sender<TenantCommand> {
        self.tenants
            .entry(tenant_id.clone())
            .or_insert_with(|| {
                TenantActor::spawn(
                    tenant_id.clone(),
                    Arc::clone(&self.dispatcher),
                    Arc::clone(&self.archive),
                    self.mailbox_capacity,
                    self.cancel.child_token(),
                )
            })
            .clone()
    }
}

/// Translate an inbound event into a tenant command, enforcing which
/// connection role may send it.
fn command_for(
    info: &ConnectionInfo,
    connection_id: &ConnectionId,
    event: InboundEvent,
) -> Result<TenantCommand, HubError> {
    match (&info.role, event) {
        (ConnectionRole::Agent { agent_id }, InboundEvent::AgentListening) => {
            Ok(TenantCommand::AgentListening {
                connection_id: connection_id.clone(),
                agent_id: agent_id.clone(),
            })
        }
        (
            ConnectionRole::Agent { agent_id },
            InboundEvent::AgentReconnected { conversation_ids },
        ) => Ok(TenantCommand::AgentReconnected {
            connection_id: connection_id.clone(),
            agent_id: agent_id.clone(),
            conversation_ids,
        }),
        (ConnectionRole::Agent { .. }, InboundEvent::ClaimRequest { user_id, channel }) => {
            Ok(TenantCommand::Claim {
                connection_id: connection_id.clone(),
                user_id,
                channel,
            })
        }
        (
            ConnectionRole::Agent { .. },
            InboundEvent::AgentReply {
                conversation_id,
                text,
            },
        ) => Ok(TenantCommand::AgentReply {
            connection_id: connection_id.clone(),
            conversation_id,
            text,
        }),
        (
            ConnectionRole::Adapter { channel },
            InboundEvent::HandoffRequest {
                user_id,
                channel: event_channel,
                message,
                timestamp,
                ..
            },
        ) => {
            // The adapter serves exactly one channel; a request naming a
            // different one is malformed.
            if event_channel != *channel {
                return Err(HubError::Conflict {
                    reason: format!(
                        "handoff channel `{event_channel}` does not match connection channel `{channel}`"
                    ),
                });
            }
            Ok(TenantCommand::Handoff {
                user_id,
                channel: event_channel,
                message,
                timestamp,
            })
        }
        (
            ConnectionRole::Adapter { channel },
            InboundEvent::UserMessage {
                conversation_id,
                user_id,
                text,
            },
        ) => Ok(TenantCommand::UserMessage {
            conversation_id,
            user_id,
            channel: *channel,
            text,
        }),
        (
            ConnectionRole::Adapter { channel },
            InboundEvent::CancelRequest {
                user_id,
                channel: event_channel,
            },
        ) => {
            if event_channel != *channel {
                return Err(HubError::Conflict {
                    reason: format!(
                        "cancel channel `{event_channel}` does not match connection channel `{channel}`"
                    ),
                });
            }
            Ok(TenantCommand::Cancel {
                user_id,
                channel: event_channel,
            })
        }
        (
            _,
            InboundEvent::EndChat {
                conversation_id,
                ended_by,
            },
        ) => Ok(TenantCommand::EndChat {
            conversation_id,
            ended_by,
        }),
        (role, event) => Err(HubError::Conflict {
            reason: format!(
                "event is not valid for a {} connection: {event:?}",
                match role {
                    ConnectionRole::Agent { .. } => "agent",
                    ConnectionRole::Adapter { .. } => "adapter",
                }
            ),
        }),
    }
}
