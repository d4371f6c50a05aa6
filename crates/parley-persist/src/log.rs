// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logging archive sink, the default when no endpoint is configured.

use async_trait::async_trait;
use tracing::info;

use parley_core::archive::ArchiveSink;
use parley_core::error::HubError;
use parley_core::types::Conversation;

/// Logs ended conversations instead of delivering them anywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogArchiveSink;

#[async_trait]
impl ArchiveSink for LogArchiveSink {
    async fn archive(&self, conversation: &Conversation) -> Result<(), HubError> {
        info!(
            conversation = %conversation.id,
            tenant = %conversation.tenant_id,
            channel = %conversation.channel,
            messages = conversation.messages.len(),
            "conversation ended (no archive endpoint configured)"
        );
        Ok(())
    }
}
