// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types for the routing hub.
//!
//! Every entity here is partitioned by tenant; no lookup crosses tenant
//! boundaries. The hub is the sole writer of all of these records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque identifier for an isolated customer organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub String);

/// Identifier for a human support agent (stable across connections).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

/// Channel-scoped end-user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Unique identifier for one live connection. An agent holding multiple
/// tabs holds one `ConnectionId` per tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    /// Mint a fresh connection id for a newly accepted socket.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Identifier for a conversation, unique within a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Derive the conversation id for an end user on a channel.
    ///
    /// The id is stable across re-enqueue cycles: the same user on the same
    /// channel always maps to the same conversation within a tenant.
    pub fn derive(channel: ChannelKind, user_id: &UserId) -> Self {
        Self(format!("{channel}:{}", user_id.0))
    }
}

macro_rules! impl_id_display {
    ($($ty:ty),*) => {
        $(
            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )*
    };
}

impl_id_display!(TenantId, AgentId, UserId, ConnectionId, ConversationId);

/// The external surface a message arrived through.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Website chat widget.
    Web,
    /// External messaging-bot process.
    Bot,
    /// Telephony gateway.
    Telephony,
}

/// Who authored a message within a conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
    System,
}

/// One message within a conversation. Immutable once appended; per-conversation
/// append order is the only ordering guarantee the hub provides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::now(Sender::User, text)
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::now(Sender::Agent, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::now(Sender::System, text)
    }

    fn now(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The fact and metadata of an agent connection currently able to receive work.
///
/// Exactly one record per live connection; created when the connection signals
/// it is listening, destroyed on disconnect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPresence {
    pub connection_id: ConnectionId,
    pub agent_id: AgentId,
    pub tenant_id: TenantId,
    pub connected_at: DateTime<Utc>,
}

/// A pending request for human takeover of a conversation.
///
/// Queue membership is what "pending" means: a request leaves the queue the
/// instant it is claimed or withdrawn. `history` holds the transcript so far,
/// starting with the initial message; it grows as the user keeps typing
/// before a claim, and carries the full prior conversation when re-enqueued
/// after an agent disconnect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffRequest {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub channel: ChannelKind,
    pub initial_message: String,
    #[serde(default)]
    pub history: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle state of a live conversation.
///
/// The bot phase is implicit (no conversation object exists) and the waiting
/// phase is represented by queue membership, so a stored conversation is
/// either assigned to an agent or ended-and-about-to-be-evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    WithAgent,
    Ended,
}

/// The authoritative record of one session mediated by the hub.
///
/// Invariant: `assigned_connection` is `Some` iff `state == WithAgent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub channel: ChannelKind,
    pub assigned_connection: Option<ConnectionId>,
    pub messages: Vec<Message>,
    pub state: ConversationState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ChannelKind::Telephony).unwrap(),
            "\"telephony\""
        );
        let parsed: ChannelKind = serde_json::from_str("\"web\"").unwrap();
        assert_eq!(parsed, ChannelKind::Web);
    }

    #[test]
    fn sender_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Sender::System).unwrap(), "\"system\"");
    }

    #[test]
    fn ids_serialize_transparently() {
        let tenant = TenantId("acme".into());
        assert_eq!(serde_json::to_string(&tenant).unwrap(), "\"acme\"");
        let parsed: TenantId = serde_json::from_str("\"acme\"").unwrap();
        assert_eq!(parsed, tenant);
    }

    #[test]
    fn conversation_id_derivation_includes_channel() {
        let id = ConversationId::derive(ChannelKind::Bot, &UserId("u42".into()));
        assert_eq!(id.0, "bot:u42");
    }

    #[test]
    fn connection_ids_are_unique() {
        assert_ne!(ConnectionId::generate(), ConnectionId::generate());
    }

    #[test]
    fn message_constructors_set_sender() {
        assert_eq!(Message::user("hi").sender, Sender::User);
        assert_eq!(Message::agent("hello").sender, Sender::Agent);
        assert_eq!(Message::system("agent joined").sender, Sender::System);
    }

    #[test]
    fn handoff_request_history_defaults_empty() {
        let json = r#"{
            "user_id": "u1",
            "tenant_id": "acme",
            "channel": "web",
            "initial_message": "help",
            "created_at": "2026-01-01T00:00:00Z"
        }"#;
        let req: HandoffRequest = serde_json::from_str(json).unwrap();
        assert!(req.history.is_empty());
    }
}
