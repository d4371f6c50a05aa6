// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The closed, tagged event protocol spoken over each connection.
//!
//! Client/adapter -> Hub (JSON):
//! ```json
//! {"type": "agent-listening"}
//! {"type": "handoff-request", "user_id": "u1", "tenant_id": "acme", "channel": "web", "message": "I need a human"}
//! {"type": "claim-request", "user_id": "u1", "channel": "web"}
//! ```
//!
//! Hub -> client/adapter (JSON):
//! ```json
//! {"type": "chat-assigned", "conversation_id": "web:u1", "user_id": "u1", "channel": "web", "history": [...]}
//! {"type": "error", "code": "conflict", "message": "request no longer available"}
//! ```
//!
//! Anything that does not deserialize into [`InboundEvent`], or fails
//! [`InboundEvent::validate`], is rejected at the boundary with an `error`
//! reply and never reaches hub state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HubError;
use crate::types::{
    ChannelKind, ConversationId, HandoffRequest, Message, Sender, UserId,
};

/// Events received by the hub from agent clients and channel adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InboundEvent {
    /// Agent connection registers presence and asks for the pending queue.
    AgentListening,

    /// Agent reconnected and requests resync of named conversations.
    AgentReconnected {
        #[serde(default)]
        conversation_ids: Vec<ConversationId>,
    },

    /// Adapter (or bot logic) signals that a human takeover is wanted.
    HandoffRequest {
        user_id: UserId,
        tenant_id: String,
        channel: ChannelKind,
        message: String,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },

    /// Agent attempts to claim a pending request.
    ClaimRequest {
        user_id: UserId,
        channel: ChannelKind,
    },

    /// End-user message relayed by an adapter. Adapters may name the
    /// conversation directly or identify the user; the channel comes from
    /// the connection's authenticated identity.
    UserMessage {
        #[serde(default)]
        conversation_id: Option<ConversationId>,
        #[serde(default)]
        user_id: Option<UserId>,
        text: String,
    },

    /// Agent reply into an assigned conversation.
    AgentReply {
        conversation_id: ConversationId,
        text: String,
    },

    /// Either side ends the conversation.
    EndChat {
        conversation_id: ConversationId,
        ended_by: Sender,
    },

    /// Requester withdraws a pending request before it is claimed.
    CancelRequest {
        user_id: UserId,
        channel: ChannelKind,
    },
}

impl InboundEvent {
    /// Boundary validation beyond what serde enforces: required identifiers
    /// must be non-empty and alternatives must not both be absent.
    pub fn validate(&self) -> Result<(), HubError> {
        match self {
            InboundEvent::AgentListening | InboundEvent::AgentReconnected { .. } => Ok(()),
            InboundEvent::HandoffRequest {
                user_id,
                tenant_id,
                message,
                ..
            } => {
                non_empty(&user_id.0, "user_id")?;
                non_empty(tenant_id, "tenant_id")?;
                non_empty(message, "message")
            }
            InboundEvent::ClaimRequest { user_id, .. } => non_empty(&user_id.0, "user_id"),
            InboundEvent::UserMessage {
                conversation_id,
                user_id,
                text,
            } => {
                match (conversation_id, user_id) {
                    (None, None) => {
                        return Err(HubError::Validation {
                            field: "conversation_id",
                        });
                    }
                    (Some(id), _) => non_empty(&id.0, "conversation_id")?,
                    (None, Some(user)) => non_empty(&user.0, "user_id")?,
                }
                non_empty(text, "text")
            }
            InboundEvent::AgentReply {
                conversation_id,
                text,
            } => {
                non_empty(&conversation_id.0, "conversation_id")?;
                non_empty(text, "text")
            }
            InboundEvent::EndChat {
                conversation_id, ..
            } => non_empty(&conversation_id.0, "conversation_id"),
            InboundEvent::CancelRequest { user_id, .. } => non_empty(&user_id.0, "user_id"),
        }
    }

    /// Tenant named inside the payload, if this event carries one.
    ///
    /// Used by the hub to enforce that payload tenants match the
    /// connection's authenticated tenant.
    pub fn payload_tenant(&self) -> Option<&str> {
        match self {
            InboundEvent::HandoffRequest { tenant_id, .. } => Some(tenant_id),
            _ => None,
        }
    }
}

fn non_empty(value: &str, field: &'static str) -> Result<(), HubError> {
    if value.trim().is_empty() {
        Err(HubError::Validation { field })
    } else {
        Ok(())
    }
}

/// Events emitted by the hub to agent clients and channel adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundEvent {
    /// Pending queue snapshot sent to a connecting or reconnecting agent.
    InitialRequests { requests: Vec<HandoffRequest> },

    /// A new pending request, broadcast to all online agents in the tenant.
    HandoffRequest { request: HandoffRequest },

    /// A request left the queue (claimed or withdrawn); agents retract the
    /// corresponding UI entry.
    RequestClaimed {
        user_id: UserId,
        channel: ChannelKind,
    },

    /// Sent to the claiming (or resyncing) agent connection with the full
    /// transcript so far.
    ChatAssigned {
        conversation_id: ConversationId,
        user_id: UserId,
        channel: ChannelKind,
        history: Vec<Message>,
    },

    /// End-user message relayed to the assigned agent connection.
    UserMessage {
        conversation_id: ConversationId,
        text: String,
    },

    /// Agent reply relayed to the originating channel adapter.
    AgentReply { user_id: UserId, text: String },

    /// The conversation ended; sent to both the agent connection and the
    /// channel adapter.
    ChatEnded {
        conversation_id: ConversationId,
        ended_by: Sender,
    },

    /// Structured error reply to the originating connection.
    Error { code: String, message: String },
}

impl OutboundEvent {
    /// Build the wire error reply for a rejected inbound event.
    pub fn error(err: &HubError) -> Self {
        OutboundEvent::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TenantId;

    #[test]
    fn inbound_tags_are_kebab_case() {
        let json = serde_json::to_string(&InboundEvent::AgentListening).unwrap();
        assert_eq!(json, r#"{"type":"agent-listening"}"#);

        let json = serde_json::to_string(&InboundEvent::ClaimRequest {
            user_id: UserId("u1".into()),
            channel: ChannelKind::Web,
        })
        .unwrap();
        assert!(json.contains(r#""type":"claim-request""#));
    }

    #[test]
    fn handoff_request_deserializes_without_timestamp() {
        let json = r#"{
            "type": "handoff-request",
            "user_id": "u1",
            "tenant_id": "acme",
            "channel": "web",
            "message": "I need a human"
        }"#;
        let event: InboundEvent = serde_json::from_str(json).unwrap();
        match event {
            InboundEvent::HandoffRequest {
                user_id,
                tenant_id,
                channel,
                timestamp,
                ..
            } => {
                assert_eq!(user_id.0, "u1");
                assert_eq!(tenant_id, "acme");
                assert_eq!(channel, ChannelKind::Web);
                assert!(timestamp.is_none());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn missing_channel_is_rejected_by_serde() {
        // Scenario: adapter sends handoff-request without the channel field.
        let json = r#"{
            "type": "handoff-request",
            "user_id": "u1",
            "tenant_id": "acme",
            "message": "help"
        }"#;
        assert!(serde_json::from_str::<InboundEvent>(json).is_err());
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let json = r#"{"type": "subscribe-topic", "topic": "anything"}"#;
        assert!(serde_json::from_str::<InboundEvent>(json).is_err());
    }

    #[test]
    fn empty_user_id_fails_validation() {
        let event = InboundEvent::ClaimRequest {
            user_id: UserId("  ".into()),
            channel: ChannelKind::Web,
        };
        let err = event.validate().unwrap_err();
        assert_eq!(err.code(), "validation");
    }

    #[test]
    fn user_message_requires_some_addressee() {
        let event = InboundEvent::UserMessage {
            conversation_id: None,
            user_id: None,
            text: "hello".into(),
        };
        assert!(event.validate().is_err());

        let event = InboundEvent::UserMessage {
            conversation_id: None,
            user_id: Some(UserId("u1".into())),
            text: "hello".into(),
        };
        assert!(event.validate().is_ok());
    }

    #[test]
    fn payload_tenant_only_on_handoff_request() {
        let event = InboundEvent::HandoffRequest {
            user_id: UserId("u1".into()),
            tenant_id: "acme".into(),
            channel: ChannelKind::Web,
            message: "help".into(),
            timestamp: None,
        };
        assert_eq!(event.payload_tenant(), Some("acme"));
        assert_eq!(InboundEvent::AgentListening.payload_tenant(), None);
    }

    #[test]
    fn outbound_error_carries_stable_code() {
        let err = HubError::Conflict {
            reason: "request no longer available".into(),
        };
        match OutboundEvent::error(&err) {
            OutboundEvent::Error { code, message } => {
                assert_eq!(code, "conflict");
                assert_eq!(message, "request no longer available");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn outbound_round_trips_with_history() {
        let event = OutboundEvent::ChatAssigned {
            conversation_id: ConversationId("web:u1".into()),
            user_id: UserId("u1".into()),
            channel: ChannelKind::Web,
            history: vec![Message::user("help"), Message::system("agent joined")],
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: OutboundEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn initial_requests_serializes_request_records() {
        let request = HandoffRequest {
            user_id: UserId("u1".into()),
            tenant_id: TenantId("acme".into()),
            channel: ChannelKind::Bot,
            initial_message: "help".into(),
            history: vec![],
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&OutboundEvent::InitialRequests {
            requests: vec![request],
        })
        .unwrap();
        assert!(json.contains(r#""type":"initial-requests""#));
        assert!(json.contains(r#""channel":"bot""#));
    }
}
