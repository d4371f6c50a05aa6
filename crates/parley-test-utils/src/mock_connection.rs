// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock connection for deterministic testing.
//!
//! Stands in for a WebSocket connection: the hub's dispatcher feeds outbound
//! events into an mpsc channel and tests read them back with timeouts.

use std::time::Duration;

use tokio::sync::mpsc;

use parley_core::event::OutboundEvent;
use parley_core::types::ConnectionId;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// One registered connection with its captured outbound event stream.
pub struct MockConnection {
    pub connection_id: ConnectionId,
    rx: mpsc::Receiver<OutboundEvent>,
}

impl MockConnection {
    pub fn new(connection_id: ConnectionId, rx: mpsc::Receiver<OutboundEvent>) -> Self {
        Self { connection_id, rx }
    }

    /// Wait for the next outbound event, panicking after the timeout.
    pub async fn recv(&mut self) -> OutboundEvent {
        tokio::time::timeout(RECV_TIMEOUT, self.rx.recv())
            .await
            .expect("timed out waiting for outbound event")
            .expect("connection channel closed")
    }

    /// Wait briefly for the next outbound event, `None` if nothing arrives.
    pub async fn try_recv(&mut self) -> Option<OutboundEvent> {
        tokio::time::timeout(Duration::from_millis(100), self.rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Assert no event arrives within a short window.
    pub async fn expect_silence(&mut self) {
        if let Some(event) = self.try_recv().await {
            panic!("expected no outbound event, got: {event:?}");
        }
    }

    /// Collect every event currently buffered, without waiting.
    pub fn drain(&mut self) -> Vec<OutboundEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}
