// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley serve` command implementation.
//!
//! Wires the routing hub to the gateway: archive sink selection, optional
//! Prometheus recorder, signal-driven graceful shutdown, and the axum
//! server loop.

use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{debug, info, warn};

use parley_config::ParleyConfig;
use parley_core::archive::ArchiveSink;
use parley_core::error::HubError;
use parley_gateway::server::{start_server, GatewayState, HealthState, ServerConfig};
use parley_gateway::AuthConfig;
use parley_hub::dispatch::Dispatcher;
use parley_hub::hub::RoutingHub;
use parley_hub::{recording, shutdown};
use parley_persist::{HttpArchiveSink, LogArchiveSink};

/// Runs the `parley serve` command.
pub async fn run_serve(config: ParleyConfig) -> Result<(), HubError> {
    // Fail-closed: refuse to serve without handshake auth configured.
    if config.gateway.bearer_token.is_none() {
        return Err(HubError::Config(
            "gateway.bearer_token is not set; refusing to start an unauthenticated gateway. \
             Set gateway.bearer_token or PARLEY_GATEWAY_BEARER_TOKEN."
                .to_string(),
        ));
    }

    init_tracing(&config.hub.log_level);

    info!("starting parley serve");

    // Install the Prometheus recorder (if enabled).
    let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> =
        if config.metrics.enabled {
            match PrometheusBuilder::new().install_recorder() {
                Ok(handle) => {
                    recording::register_metrics();
                    info!("prometheus metrics enabled");
                    Some(Arc::new(move || handle.render()))
                }
                Err(err) => {
                    warn!(error = %err, "prometheus initialization failed, continuing without metrics");
                    None
                }
            }
        } else {
            debug!("metrics disabled by configuration");
            None
        };

    // Select the archive sink.
    let archive: Arc<dyn ArchiveSink> = match config.archive.endpoint {
        Some(ref endpoint) => {
            let sink = HttpArchiveSink::new(
                endpoint.clone(),
                Duration::from_secs(config.archive.timeout_secs),
                config.archive.max_attempts,
                Duration::from_millis(config.archive.backoff_ms),
            )?;
            info!(endpoint = endpoint.as_str(), "http archive sink enabled");
            Arc::new(sink)
        }
        None => {
            info!("no archive endpoint configured, ended conversations will be logged");
            Arc::new(LogArchiveSink)
        }
    };

    // Install signal handler.
    let cancel = shutdown::install_signal_handler();

    // Assemble the hub and gateway.
    let hub = Arc::new(RoutingHub::new(
        Arc::new(Dispatcher::new()),
        archive,
        config.hub.mailbox_capacity,
        cancel.clone(),
    ));

    let state = GatewayState {
        hub,
        auth: AuthConfig {
            bearer_token: config.gateway.bearer_token.clone(),
        },
        health: HealthState {
            start_time: std::time::Instant::now(),
            prometheus_render,
        },
    };
    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };

    start_server(&server_config, state, cancel).await?;

    info!("parley serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serve_refuses_to_start_without_auth() {
        let config = ParleyConfig::default();
        assert!(config.gateway.bearer_token.is_none());

        let err = run_serve(config).await.unwrap_err();
        assert_eq!(err.code(), "config");
        assert!(err.to_string().contains("bearer_token"));
    }
}
