// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending handoff request queue for one tenant.
//!
//! FIFO, deduplicated by `(user, channel)`. Queue membership is the
//! definition of "pending": removal is the claim linearization point the
//! tenant actor relies on.

use std::collections::VecDeque;

use parley_core::types::{ChannelKind, HandoffRequest, UserId};

/// Pending handoff requests, oldest first.
#[derive(Debug, Default)]
pub struct RequestQueue {
    pending: VecDeque<HandoffRequest>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a request at the tail.
    ///
    /// Returns `false` (no-op) when a pending request already exists for the
    /// same `(user, channel)` key.
    pub fn add(&mut self, request: HandoffRequest) -> bool {
        if self.contains(&request.user_id, request.channel) {
            return false;
        }
        self.pending.push_back(request);
        true
    }

    /// Remove the pending request for `(user, channel)`, if any.
    ///
    /// Used for both claims and withdrawals; returning `None` is how later
    /// claimants on the same request are turned away.
    pub fn remove(&mut self, user_id: &UserId, channel: ChannelKind) -> Option<HandoffRequest> {
        let idx = self
            .pending
            .iter()
            .position(|r| &r.user_id == user_id && r.channel == channel)?;
        self.pending.remove(idx)
    }

    /// Current queue, oldest first, for initial sync on connect/reconnect.
    pub fn list_pending(&self) -> impl Iterator<Item = &HandoffRequest> {
        self.pending.iter()
    }

    /// Mutable access to a pending request, for accumulating user messages
    /// that arrive while the request waits to be claimed.
    pub fn get_mut(
        &mut self,
        user_id: &UserId,
        channel: ChannelKind,
    ) -> Option<&mut HandoffRequest> {
        self.pending
            .iter_mut()
            .find(|r| &r.user_id == user_id && r.channel == channel)
    }

    pub fn contains(&self, user_id: &UserId, channel: ChannelKind) -> bool {
        self.pending
            .iter()
            .any(|r| &r.user_id == user_id && r.channel == channel)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parley_core::types::TenantId;

    fn request(user: &str, channel: ChannelKind) -> HandoffRequest {
        HandoffRequest {
            user_id: UserId(user.to_string()),
            tenant_id: TenantId("acme".to_string()),
            channel,
            initial_message: "help".to_string(),
            history: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn add_then_remove_round_trips() {
        let mut queue = RequestQueue::new();
        assert!(queue.add(request("u1", ChannelKind::Web)));

        let removed = queue.remove(&UserId("u1".into()), ChannelKind::Web);
        assert!(removed.is_some());
        assert!(queue.is_empty());
    }

    #[test]
    fn duplicate_pending_request_is_a_noop() {
        let mut queue = RequestQueue::new();
        assert!(queue.add(request("u1", ChannelKind::Web)));
        assert!(!queue.add(request("u1", ChannelKind::Web)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn same_user_on_different_channels_is_not_a_duplicate() {
        let mut queue = RequestQueue::new();
        assert!(queue.add(request("u1", ChannelKind::Web)));
        assert!(queue.add(request("u1", ChannelKind::Telephony)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn second_remove_returns_none() {
        // The claim race: the first removal wins, the second finds nothing.
        let mut queue = RequestQueue::new();
        queue.add(request("u1", ChannelKind::Web));

        assert!(queue.remove(&UserId("u1".into()), ChannelKind::Web).is_some());
        assert!(queue.remove(&UserId("u1".into()), ChannelKind::Web).is_none());
    }

    #[test]
    fn list_pending_is_fifo() {
        let mut queue = RequestQueue::new();
        queue.add(request("u1", ChannelKind::Web));
        queue.add(request("u2", ChannelKind::Web));
        queue.add(request("u3", ChannelKind::Bot));

        let order: Vec<String> = queue.list_pending().map(|r| r.user_id.0.clone()).collect();
        assert_eq!(order, vec!["u1", "u2", "u3"]);
    }

    #[test]
    fn remove_from_middle_preserves_order() {
        let mut queue = RequestQueue::new();
        queue.add(request("u1", ChannelKind::Web));
        queue.add(request("u2", ChannelKind::Web));
        queue.add(request("u3", ChannelKind::Web));

        queue.remove(&UserId("u2".into()), ChannelKind::Web);
        let order: Vec<String> = queue.list_pending().map(|r| r.user_id.0.clone()).collect();
        assert_eq!(order, vec!["u1", "u3"]);
    }

    #[test]
    fn get_mut_allows_history_accumulation() {
        let mut queue = RequestQueue::new();
        queue.add(request("u1", ChannelKind::Web));

        let pending = queue
            .get_mut(&UserId("u1".into()), ChannelKind::Web)
            .expect("request should be pending");
        pending
            .history
            .push(parley_core::types::Message::user("still there?"));

        let reread = queue.remove(&UserId("u1".into()), ChannelKind::Web).unwrap();
        assert_eq!(reread.history.len(), 1);
        assert_eq!(reread.history[0].text, "still there?");
    }
}
