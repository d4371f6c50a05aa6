// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The archival seam toward the external persistence collaborator.
//!
//! The hub owns no durable storage: when a conversation ends it is evicted
//! from live state first, then handed to an [`ArchiveSink`] from a spawned
//! task. A failed delivery is logged, never propagated, and never rolls back
//! the in-memory transition.

use async_trait::async_trait;

use crate::error::HubError;
use crate::types::Conversation;

/// Destination for ended conversations.
///
/// Implementations own their retry policy; callers treat a returned error as
/// final and log it.
#[async_trait]
pub trait ArchiveSink: Send + Sync {
    /// Deliver one ended conversation (full message list plus tenant and
    /// channel metadata) for archival.
    async fn archive(&self, conversation: &Conversation) -> Result<(), HubError>;
}
