// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tenant actor owning the presence registry, request queue, and
//! conversation store.
//!
//! All state-mutating operations for one tenant flow through this actor's
//! mailbox and are processed strictly sequentially, which is what makes the
//! at-most-one-claim and no-duplicate-pending invariants hold under
//! concurrent load. Different tenants run fully in parallel.
//!
//! Command handling is synchronous: the actor never awaits while holding
//! tenant state. Outbound delivery is `try_send` through the dispatcher and
//! archival happens in a spawned task after eviction.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use parley_core::archive::ArchiveSink;
use parley_core::error::HubError;
use parley_core::event::OutboundEvent;
use parley_core::types::{
    AgentId, ChannelKind, ConnectionId, Conversation, ConversationId, HandoffRequest, Message,
    Sender, TenantId, UserId,
};

use crate::conversation::ConversationStore;
use crate::dispatch::Dispatcher;
use crate::presence::PresenceRegistry;
use crate::queue::RequestQueue;
use crate::recording;

/// Commands processed sequentially by a tenant actor.
#[derive(Debug)]
pub enum TenantCommand {
    /// Agent connection registers presence and asks for the pending queue.
    AgentListening {
        connection_id: ConnectionId,
        agent_id: AgentId,
    },
    /// Agent reconnected; re-register presence and resync named conversations.
    AgentReconnected {
        connection_id: ConnectionId,
        agent_id: AgentId,
        conversation_ids: Vec<ConversationId>,
    },
    /// A connection closed; remove presence and re-enqueue its conversations.
    ConnectionClosed { connection_id: ConnectionId },
    /// Adapter raised a handoff request.
    Handoff {
        user_id: UserId,
        channel: ChannelKind,
        message: String,
        timestamp: Option<DateTime<Utc>>,
    },
    /// Requester withdrew a pending request before it was claimed.
    Cancel {
        user_id: UserId,
        channel: ChannelKind,
    },
    /// Agent attempts to claim a pending request.
    Claim {
        connection_id: ConnectionId,
        user_id: UserId,
        channel: ChannelKind,
    },
    /// End-user message relayed by an adapter.
    UserMessage {
        conversation_id: Option<ConversationId>,
        user_id: Option<UserId>,
        channel: ChannelKind,
        text: String,
    },
    /// Agent reply into an assigned conversation.
    AgentReply {
        connection_id: ConnectionId,
        conversation_id: ConversationId,
        text: String,
    },
    /// Either side ends the conversation.
    EndChat {
        conversation_id: ConversationId,
        ended_by: Sender,
    },
    /// Read-only snapshot for health reporting and tests.
    Snapshot {
        reply: oneshot::Sender<TenantSnapshot>,
    },
}

/// Point-in-time counts for one tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantSnapshot {
    pub online_agents: usize,
    pub pending_requests: usize,
    pub active_conversations: usize,
}

/// The actor state: the three stores plus the shared dispatch/archive seams.
pub struct TenantActor {
    tenant_id: TenantId,
    presence: PresenceRegistry,
    queue: RequestQueue,
    conversations: ConversationStore,
    dispatcher: Arc<Dispatcher>,
    archive: Arc<dyn ArchiveSink>,
}

impl TenantActor {
    /// Spawn the actor task for a tenant, returning its mailbox sender.
    ///
    /// The task runs until the mailbox closes or the cancellation token
    /// fires; on cancellation it drains already-enqueued commands before
    /// exiting.
    pub fn spawn(
        tenant_id: TenantId,
        dispatcher: Arc<Dispatcher>,
        archive: Arc<dyn ArchiveSink>,
        mailbox_capacity: usize,
        cancel: CancellationToken,
    ) -> mpsc::Sender<TenantCommand> {
        let (tx, mut rx) = mpsc::channel(mailbox_capacity);
        let mut actor = TenantActor {
            tenant_id: tenant_id.clone(),
            presence: PresenceRegistry::new(),
            queue: RequestQueue::new(),
            conversations: ConversationStore::new(),
            dispatcher,
            archive,
        };

        tokio::spawn(async move {
            info!(tenant = %tenant_id, "tenant actor started");
            loop {
                tokio::select! {
                    command = rx.recv() => {
                        match command {
                            Some(command) => actor.handle(command),
                            None => break,
                        }
                    }
                    _ = cancel.cancelled() => {
                        // Drain whatever is already enqueued, then stop.
                        while let Ok(command) = rx.try_recv() {
                            actor.handle(command);
                        }
                        break;
                    }
                }
            }
            info!(tenant = %tenant_id, "tenant actor stopped");
        });

        tx
    }

    /// Dispatch one command. Deliberately synchronous: no await happens
    /// between reading and writing tenant state.
    fn handle(&mut self, command: TenantCommand) {
        match command {
            TenantCommand::AgentListening {
                connection_id,
                agent_id,
            } => self.on_agent_listening(connection_id, agent_id),
            TenantCommand::AgentReconnected {
                connection_id,
                agent_id,
                conversation_ids,
            } => self.on_agent_reconnected(connection_id, agent_id, conversation_ids),
            TenantCommand::ConnectionClosed { connection_id } => {
                self.on_connection_closed(connection_id)
            }
            TenantCommand::Handoff {
                user_id,
                channel,
                message,
                timestamp,
            } => self.on_handoff(user_id, channel, message, timestamp),
            TenantCommand::Cancel { user_id, channel } => self.on_cancel(user_id, channel),
            TenantCommand::Claim {
                connection_id,
                user_id,
                channel,
            } => self.on_claim(connection_id, user_id, channel),
            TenantCommand::UserMessage {
                conversation_id,
                user_id,
                channel,
                text,
            } => self.on_user_message(conversation_id, user_id, channel, text),
            TenantCommand::AgentReply {
                connection_id,
                conversation_id,
                text,
            } => self.on_agent_reply(connection_id, conversation_id, text),
            TenantCommand::EndChat {
                conversation_id,
                ended_by,
            } => self.on_end_chat(conversation_id, ended_by),
            TenantCommand::Snapshot { reply } => {
                let _ = reply.send(TenantSnapshot {
                    online_agents: self.presence.len(),
                    pending_requests: self.queue.len(),
                    active_conversations: self.conversations.len(),
                });
            }
        }
    }

    fn on_agent_listening(&mut self, connection_id: ConnectionId, agent_id: AgentId) {
        self.presence
            .register(connection_id.clone(), agent_id, self.tenant_id.clone());
        self.send_initial_requests(&connection_id);
    }

    fn on_agent_reconnected(
        &mut self,
        connection_id: ConnectionId,
        agent_id: AgentId,
        conversation_ids: Vec<ConversationId>,
    ) {
        self.presence
            .register(connection_id.clone(), agent_id.clone(), self.tenant_id.clone());

        for conversation_id in conversation_ids {
            let Some(conversation) = self.conversations.get(&conversation_id) else {
                // Unknown means it ended or was re-enqueued; the agent will
                // see it in initial-requests if it is pending again.
                debug!(conversation = %conversation_id, "resync for unknown conversation skipped");
                continue;
            };
            // A conversation can be resumed onto this connection when its
            // holder is this connection, a dead connection, or another
            // connection of the same agent (newest tab wins).
            let resumable = match conversation.assigned_connection {
                None => true,
                Some(ref assigned) => {
                    assigned == &connection_id
                        || match self
                            .presence
                            .list_online()
                            .find(|p| &p.connection_id == assigned)
                        {
                            None => true,
                            Some(holder) => holder.agent_id == agent_id,
                        }
                }
            };
            if !resumable {
                debug!(
                    conversation = %conversation_id,
                    "resync refused, conversation held by a live connection"
                );
                continue;
            }
            if let Some(conversation) =
                self.conversations.rebind(&conversation_id, connection_id.clone())
            {
                self.dispatcher.send(
                    &connection_id,
                    OutboundEvent::ChatAssigned {
                        conversation_id: conversation.id.clone(),
                        user_id: conversation.user_id.clone(),
                        channel: conversation.channel,
                        history: conversation.messages.clone(),
                    },
                );
            }
        }

        self.send_initial_requests(&connection_id);
    }

    fn on_connection_closed(&mut self, connection_id: ConnectionId) {
        if let Some(presence) = self.presence.remove(&connection_id) {
            debug!(
                tenant = %self.tenant_id,
                agent = %presence.agent_id,
                connection = %connection_id,
                "agent connection removed"
            );
        }

        // Conversations held by the dead connection go back to the queue
        // with their transcript, instead of being orphaned. Scanned even
        // when no presence entry existed: a connection may claim without
        // ever having signalled it is listening.
        for conversation in self.conversations.take_assigned(&connection_id) {
            self.requeue(conversation);
        }
    }

    fn requeue(&mut self, conversation: Conversation) {
        let mut history = conversation.messages;
        history.push(Message::system("agent disconnected"));
        let initial_message = history
            .iter()
            .find(|m| m.sender == Sender::User)
            .map(|m| m.text.clone())
            .unwrap_or_default();

        let request = HandoffRequest {
            user_id: conversation.user_id,
            tenant_id: self.tenant_id.clone(),
            channel: conversation.channel,
            initial_message,
            history,
            created_at: Utc::now(),
        };

        if self.queue.add(request.clone()) {
            recording::record_conversation_requeued(&self.tenant_id.0);
            info!(
                tenant = %self.tenant_id,
                user = %request.user_id,
                channel = %request.channel,
                "conversation re-enqueued after agent disconnect"
            );
            self.broadcast_to_agents(OutboundEvent::HandoffRequest { request });
        } else {
            warn!(
                tenant = %self.tenant_id,
                user = %request.user_id,
                "re-enqueue found a pending request for the same key"
            );
        }
    }

    fn on_handoff(
        &mut self,
        user_id: UserId,
        channel: ChannelKind,
        message: String,
        timestamp: Option<DateTime<Utc>>,
    ) {
        let conversation_id = ConversationId::derive(channel, &user_id);
        if self.conversations.get(&conversation_id).is_some() {
            debug!(
                conversation = %conversation_id,
                "handoff ignored, conversation already with an agent"
            );
            return;
        }

        let created_at = timestamp.unwrap_or_else(Utc::now);
        let request = HandoffRequest {
            user_id,
            tenant_id: self.tenant_id.clone(),
            channel,
            initial_message: message.clone(),
            // History always begins with the initial message, so the
            // transcript handed over at claim time is self-contained.
            history: vec![Message {
                sender: Sender::User,
                text: message,
                timestamp: created_at,
            }],
            created_at,
        };

        if self.queue.add(request.clone()) {
            recording::record_request_queued(&self.tenant_id.0);
            self.broadcast_to_agents(OutboundEvent::HandoffRequest { request });
        } else {
            debug!(
                tenant = %self.tenant_id,
                user = %request.user_id,
                channel = %request.channel,
                "duplicate pending handoff request ignored"
            );
        }
    }

    fn on_cancel(&mut self, user_id: UserId, channel: ChannelKind) {
        if self.queue.remove(&user_id, channel).is_some() {
            debug!(
                tenant = %self.tenant_id,
                user = %user_id,
                "pending request withdrawn by requester"
            );
            // Same retraction notice as a claim, so agent UIs drop the entry.
            self.broadcast_to_agents(OutboundEvent::RequestClaimed { user_id, channel });
        } else {
            debug!(user = %user_id, "cancel for request that is not pending");
        }
    }

    fn on_claim(&mut self, connection_id: ConnectionId, user_id: UserId, channel: ChannelKind) {
        // Queue removal is the linearization point: the first claim the
        // actor processes wins, every later claimant finds the request gone.
        let Some(request) = self.queue.remove(&user_id, channel) else {
            recording::record_claim_rejected(&self.tenant_id.0);
            self.dispatcher.send(
                &connection_id,
                OutboundEvent::error(&HubError::Conflict {
                    reason: "request no longer available".to_string(),
                }),
            );
            return;
        };

        let conversation_id = ConversationId::derive(channel, &user_id);
        let mut messages = request.history;
        messages.push(Message::system("agent joined"));

        if let Err(err) = self.conversations.create(
            conversation_id.clone(),
            self.tenant_id.clone(),
            user_id.clone(),
            channel,
            connection_id.clone(),
            messages.clone(),
        ) {
            warn!(
                conversation = %conversation_id,
                error = %err,
                "claim raced a live conversation"
            );
            self.dispatcher
                .send(&connection_id, OutboundEvent::error(&err));
            return;
        }

        recording::record_claim_won(&self.tenant_id.0);
        info!(
            tenant = %self.tenant_id,
            conversation = %conversation_id,
            connection = %connection_id,
            "request claimed"
        );

        self.broadcast_to_agents(OutboundEvent::RequestClaimed {
            user_id: user_id.clone(),
            channel,
        });
        self.dispatcher.send(
            &connection_id,
            OutboundEvent::ChatAssigned {
                conversation_id,
                user_id,
                channel,
                history: messages,
            },
        );
    }

    fn on_user_message(
        &mut self,
        conversation_id: Option<ConversationId>,
        user_id: Option<UserId>,
        channel: ChannelKind,
        text: String,
    ) {
        let conversation_id = match (conversation_id, &user_id) {
            (Some(id), _) => id,
            (None, Some(user)) => ConversationId::derive(channel, user),
            // Rejected at the boundary; unreachable in practice.
            (None, None) => return,
        };

        if let Some(conversation) = self.conversations.get(&conversation_id) {
            let assigned = conversation.assigned_connection.clone();
            self.conversations
                .append_message(&conversation_id, Message::user(text.clone()));
            if let Some(agent_connection) = assigned {
                self.dispatcher.send(
                    &agent_connection,
                    OutboundEvent::UserMessage {
                        conversation_id,
                        text,
                    },
                );
            }
            return;
        }

        // Not yet claimed: accumulate onto the pending request so the
        // claiming agent sees the full transcript.
        if let Some(user) = user_id
            && let Some(pending) = self.queue.get_mut(&user, channel)
        {
            pending.history.push(Message::user(text));
            return;
        }

        // Late or bot-phase traffic; legitimate, so log-and-ignore.
        debug!(
            tenant = %self.tenant_id,
            conversation = %conversation_id,
            "user message for unknown conversation ignored"
        );
    }

    fn on_agent_reply(
        &mut self,
        connection_id: ConnectionId,
        conversation_id: ConversationId,
        text: String,
    ) {
        let Some(conversation) = self.conversations.get(&conversation_id) else {
            debug!(
                conversation = %conversation_id,
                "agent reply for unknown conversation ignored"
            );
            return;
        };
        if conversation.assigned_connection.as_ref() != Some(&connection_id) {
            warn!(
                conversation = %conversation_id,
                connection = %connection_id,
                "agent reply from a connection that does not hold the conversation"
            );
            self.dispatcher.send(
                &connection_id,
                OutboundEvent::error(&HubError::Conflict {
                    reason: "conversation is assigned to another connection".to_string(),
                }),
            );
            return;
        }

        let user_id = conversation.user_id.clone();
        let channel = conversation.channel;
        self.conversations
            .append_message(&conversation_id, Message::agent(text.clone()));
        self.dispatcher.send_to_adapter(
            &self.tenant_id,
            channel,
            OutboundEvent::AgentReply { user_id, text },
        );
    }

    fn on_end_chat(&mut self, conversation_id: ConversationId, ended_by: Sender) {
        // Capture the holder before eviction clears the assignment.
        let assigned = self
            .conversations
            .get(&conversation_id)
            .and_then(|c| c.assigned_connection.clone());

        let Some(conversation) = self.conversations.end(&conversation_id) else {
            // Idempotent: a second end-chat observes nothing.
            debug!(
                conversation = %conversation_id,
                "end-chat for unknown conversation ignored"
            );
            return;
        };

        recording::record_conversation_ended(&self.tenant_id.0);
        info!(
            tenant = %self.tenant_id,
            conversation = %conversation_id,
            ended_by = %ended_by,
            "conversation ended"
        );

        let notice = OutboundEvent::ChatEnded {
            conversation_id,
            ended_by,
        };
        if let Some(agent_connection) = assigned {
            self.dispatcher.send(&agent_connection, notice.clone());
        }
        self.dispatcher
            .send_to_adapter(&self.tenant_id, conversation.channel, notice);

        self.archive_in_background(conversation);
    }

    /// Hand an evicted conversation to the archive sink from a spawned task.
    /// The sink owns its retry policy; a final failure is logged, never
    /// propagated, and the eviction is not rolled back.
    fn archive_in_background(&self, conversation: Conversation) {
        let sink = Arc::clone(&self.archive);
        tokio::spawn(async move {
            if let Err(err) = sink.archive(&conversation).await {
                warn!(
                    conversation = %conversation.id,
                    tenant = %conversation.tenant_id,
                    error = %err,
                    "conversation archival failed"
                );
            }
        });
    }

    fn send_initial_requests(&self, connection_id: &ConnectionId) {
        let requests = self.queue.list_pending().cloned().collect();
        self.dispatcher
            .send(connection_id, OutboundEvent::InitialRequests { requests });
    }

    fn broadcast_to_agents(&self, event: OutboundEvent) {
        for presence in self.presence.list_online() {
            self.dispatcher.send(&presence.connection_id, event.clone());
        }
    }
}
