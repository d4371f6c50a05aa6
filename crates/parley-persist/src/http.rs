// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP archive sink.
//!
//! POSTs each ended conversation as JSON to the external persistence
//! collaborator, with bounded retry and exponential backoff per delivery.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use parley_core::archive::ArchiveSink;
use parley_core::error::HubError;
use parley_core::types::Conversation;

/// Delivers conversations to an HTTP endpoint.
pub struct HttpArchiveSink {
    client: reqwest::Client,
    endpoint: String,
    max_attempts: u32,
    base_backoff: Duration,
}

impl HttpArchiveSink {
    /// Build a sink for the given endpoint.
    ///
    /// `timeout` applies per attempt; `base_backoff` doubles after each
    /// failed attempt.
    pub fn new(
        endpoint: String,
        timeout: Duration,
        max_attempts: u32,
        base_backoff: Duration,
    ) -> Result<Self, HubError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HubError::Archive {
                message: format!("failed to build archive HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            endpoint,
            max_attempts: max_attempts.max(1),
            base_backoff,
        })
    }

    async fn attempt(&self, conversation: &Conversation) -> Result<(), HubError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(conversation)
            .send()
            .await
            .map_err(|e| HubError::Archive {
                message: format!("archive request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(HubError::Archive {
                message: format!("archive endpoint returned {}", response.status()),
                source: None,
            })
        }
    }
}

#[async_trait]
impl ArchiveSink for HttpArchiveSink {
    async fn archive(&self, conversation: &Conversation) -> Result<(), HubError> {
        let mut backoff = self.base_backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.attempt(conversation).await {
                Ok(()) => {
                    debug!(
                        conversation = %conversation.id,
                        tenant = %conversation.tenant_id,
                        attempt,
                        "conversation archived"
                    );
                    return Ok(());
                }
                Err(err) => {
                    if attempt >= self.max_attempts {
                        return Err(err);
                    }
                    warn!(
                        conversation = %conversation.id,
                        attempt,
                        error = %err,
                        "archive delivery failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }
}
