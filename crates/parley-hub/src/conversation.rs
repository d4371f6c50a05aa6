// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live conversation store for one tenant.
//!
//! Holds the authoritative state of every session currently mediated by the
//! hub. The tenant actor is the sole writer; a conversation that reaches
//! `Ended` is evicted immediately and handed to the archive sink outside the
//! actor loop.

use std::collections::HashMap;

use tracing::debug;

use parley_core::error::HubError;
use parley_core::types::{
    ChannelKind, ConnectionId, Conversation, ConversationId, ConversationState, Message, TenantId,
    UserId,
};

/// In-memory map of active conversations, keyed by conversation id.
#[derive(Debug, Default)]
pub struct ConversationStore {
    active: HashMap<ConversationId, Conversation>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation assigned to an agent connection.
    ///
    /// Fails with [`HubError::Conflict`] if a conversation already exists for
    /// the key; the hub resolves claim races before calling this, so a
    /// conflict here means a duplicate claim slipped past the queue.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &mut self,
        id: ConversationId,
        tenant_id: TenantId,
        user_id: UserId,
        channel: ChannelKind,
        assigned_connection: ConnectionId,
        messages: Vec<Message>,
    ) -> Result<(), HubError> {
        if self.active.contains_key(&id) {
            return Err(HubError::Conflict {
                reason: format!("conversation `{id}` already active"),
            });
        }
        self.active.insert(
            id.clone(),
            Conversation {
                id,
                tenant_id,
                user_id,
                channel,
                assigned_connection: Some(assigned_connection),
                messages,
                state: ConversationState::WithAgent,
            },
        );
        Ok(())
    }

    /// Append a message to a conversation.
    ///
    /// A miss is non-fatal: messages may legitimately arrive after the
    /// conversation ended, so this logs and returns `false` instead of
    /// erroring.
    pub fn append_message(&mut self, id: &ConversationId, message: Message) -> bool {
        match self.active.get_mut(id) {
            Some(conversation) if conversation.state == ConversationState::WithAgent => {
                conversation.messages.push(message);
                true
            }
            _ => {
                debug!(conversation = %id, "append to absent or ended conversation ignored");
                false
            }
        }
    }

    /// Reassign a conversation to a different agent connection (reconnect
    /// resync). Returns the updated record for the caller to echo back.
    pub fn rebind(
        &mut self,
        id: &ConversationId,
        connection_id: ConnectionId,
    ) -> Option<&Conversation> {
        let conversation = self.active.get_mut(id)?;
        conversation.assigned_connection = Some(connection_id);
        Some(conversation)
    }

    /// Transition a conversation to `Ended` and evict it from the live map.
    ///
    /// Returns the final record so it can be archived; `None` when the
    /// conversation is unknown (idempotent end).
    pub fn end(&mut self, id: &ConversationId) -> Option<Conversation> {
        let mut conversation = self.active.remove(id)?;
        conversation.state = ConversationState::Ended;
        conversation.assigned_connection = None;
        Some(conversation)
    }

    pub fn get(&self, id: &ConversationId) -> Option<&Conversation> {
        self.active.get(id)
    }

    /// All live conversations for the tenant.
    pub fn list(&self) -> impl Iterator<Item = &Conversation> {
        self.active.values()
    }

    /// Remove and return every conversation assigned to the given connection.
    ///
    /// Used on agent disconnect: each returned conversation is re-enqueued
    /// as a fresh handoff request carrying its accumulated history.
    pub fn take_assigned(&mut self, connection_id: &ConnectionId) -> Vec<Conversation> {
        let ids: Vec<ConversationId> = self
            .active
            .values()
            .filter(|c| c.assigned_connection.as_ref() == Some(connection_id))
            .map(|c| c.id.clone())
            .collect();
        ids.into_iter()
            .filter_map(|id| self.active.remove(&id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
