// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parley conversation routing hub.
//!
//! This crate provides the domain types (tenants, conversations, handoff
//! requests, presence records), the closed inbound/outbound event protocol
//! spoken by agent clients and channel adapters, and the error taxonomy used
//! throughout the Parley workspace.

pub mod archive;
pub mod error;
pub mod event;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use archive::ArchiveSink;
pub use error::HubError;
pub use event::{InboundEvent, OutboundEvent};
pub use types::{
    AgentId, AgentPresence, ChannelKind, ConnectionId, Conversation, ConversationId,
    ConversationState, HandoffRequest, Message, Sender, TenantId, UserId,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_error_codes_are_stable() {
        // Wire codes are part of the protocol; a rename here breaks clients.
        assert_eq!(HubError::Validation { field: "user_id" }.code(), "validation");
        assert_eq!(
            HubError::Conflict {
                reason: "taken".into()
            }
            .code(),
            "conflict"
        );
        assert_eq!(
            HubError::NotFound {
                what: "conversation".into()
            }
            .code(),
            "not_found"
        );
        assert_eq!(
            HubError::TenantMismatch {
                event_tenant: "a".into(),
                connection_tenant: "b".into()
            }
            .code(),
            "tenant_mismatch"
        );
    }

    #[test]
    fn channel_kind_round_trips_through_strings() {
        use std::str::FromStr;

        for kind in [ChannelKind::Web, ChannelKind::Bot, ChannelKind::Telephony] {
            let s = kind.to_string();
            let parsed = ChannelKind::from_str(&s).expect("should parse back");
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn conversation_id_is_stable_for_user_and_channel() {
        let a = ConversationId::derive(ChannelKind::Web, &UserId("u1".into()));
        let b = ConversationId::derive(ChannelKind::Web, &UserId("u1".into()));
        let c = ConversationId::derive(ChannelKind::Telephony, &UserId("u1".into()));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
