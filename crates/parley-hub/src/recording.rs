// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics.

use metrics::{describe_counter, describe_gauge};

/// Register all Parley metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "parley_handoff_requests_total",
        "Handoff requests accepted into a tenant queue"
    );
    describe_counter!("parley_claims_won_total", "Successful request claims");
    describe_counter!(
        "parley_claims_rejected_total",
        "Claims rejected because the request was gone"
    );
    describe_counter!(
        "parley_conversations_ended_total",
        "Conversations ended and handed to archival"
    );
    describe_counter!(
        "parley_conversations_requeued_total",
        "Conversations re-enqueued after their agent disconnected"
    );
    describe_gauge!("parley_connections", "Currently registered connections");
}

/// Record a handoff request entering a tenant queue.
pub fn record_request_queued(tenant: &str) {
    metrics::counter!("parley_handoff_requests_total", "tenant" => tenant.to_string())
        .increment(1);
}

/// Record a claim won by an agent.
pub fn record_claim_won(tenant: &str) {
    metrics::counter!("parley_claims_won_total", "tenant" => tenant.to_string()).increment(1);
}

/// Record a claim turned away because the request was already gone.
pub fn record_claim_rejected(tenant: &str) {
    metrics::counter!("parley_claims_rejected_total", "tenant" => tenant.to_string())
        .increment(1);
}

/// Record a conversation ending.
pub fn record_conversation_ended(tenant: &str) {
    metrics::counter!("parley_conversations_ended_total", "tenant" => tenant.to_string())
        .increment(1);
}

/// Record a conversation re-enqueued after agent disconnect.
pub fn record_conversation_requeued(tenant: &str) {
    metrics::counter!("parley_conversations_requeued_total", "tenant" => tenant.to_string())
        .increment(1);
}

/// Set the number of currently registered connections.
pub fn set_connections(count: f64) {
    metrics::gauge!("parley_connections").set(count);
}
