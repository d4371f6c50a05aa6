// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Archive sink that captures ended conversations for assertions.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use parley_core::archive::ArchiveSink;
use parley_core::error::HubError;
use parley_core::types::Conversation;

/// An [`ArchiveSink`] that records every conversation it receives.
#[derive(Default)]
pub struct CaptureArchiveSink {
    archived: Mutex<Vec<Conversation>>,
    notify: Notify,
}

impl CaptureArchiveSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of everything archived so far.
    pub async fn archived(&self) -> Vec<Conversation> {
        self.archived.lock().await.clone()
    }

    pub async fn archived_count(&self) -> usize {
        self.archived.lock().await.len()
    }

    /// Wait until at least `count` conversations have been archived.
    ///
    /// Archival happens in spawned tasks after eviction, so tests need a
    /// rendezvous point before asserting on the sink.
    pub async fn wait_for(&self, count: usize) {
        let deadline = Duration::from_secs(2);
        tokio::time::timeout(deadline, async {
            loop {
                // Register the waiter before checking, so a push landing
                // between the check and the await still wakes us.
                let notified = self.notify.notified();
                if self.archived.lock().await.len() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .expect("timed out waiting for archived conversations");
    }
}

#[async_trait]
impl ArchiveSink for CaptureArchiveSink {
    async fn archive(&self, conversation: &Conversation) -> Result<(), HubError> {
        self.archived.lock().await.push(conversation.clone());
        self.notify.notify_waiters();
        Ok(())
    }
}
