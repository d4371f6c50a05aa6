// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP handlers for the unauthenticated operational endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status string.
    pub status: String,
    /// Binary version.
    pub version: String,
    /// Seconds since the gateway started.
    pub uptime_secs: u64,
    /// Tenants with a running actor.
    pub tenants: usize,
    /// Currently registered connections.
    pub connections: usize,
}

/// GET /health
///
/// Unauthenticated liveness endpoint for systemd and load balancers.
pub async fn get_public_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let stats = state.hub.stats();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        tenants: stats.tenants,
        connections: stats.connections,
    })
}

/// GET /metrics
///
/// Renders Prometheus metrics when a recorder is installed; 404 otherwise.
pub async fn get_public_metrics(State(state): State<GatewayState>) -> Response {
    match state.health.prometheus_render {
        Some(ref render) => (StatusCode::OK, render()).into_response(),
        None => (StatusCode::NOT_FOUND, "metrics not enabled").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            uptime_secs: 42,
            tenants: 2,
            connections: 5,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"tenants\":2"));
        assert!(json.contains("\"connections\":5"));
    }
}
