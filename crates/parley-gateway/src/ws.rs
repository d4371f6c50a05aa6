// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket handler: the transport end of the event protocol.
//!
//! Each accepted socket becomes one hub connection. Two halves run
//! concurrently:
//! 1. Sender task: forwards outbound events from the hub to the socket
//! 2. Receiver loop: decodes inbound frames and hands them to the hub
//!
//! A frame that does not decode into an [`InboundEvent`] gets a structured
//! `error` reply and is otherwise ignored; it never reaches hub state.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use parley_core::event::{InboundEvent, OutboundEvent};
use parley_core::types::ConnectionId;

use crate::auth::{self, WsQuery};
use crate::server::GatewayState;

/// Outbound buffer per connection. A client that stops reading loses events
/// past this depth rather than stalling a tenant actor.
const OUTBOUND_BUFFER: usize = 64;

/// WebSocket upgrade handler.
///
/// Authenticates the handshake (token + identity query parameters) before
/// upgrading; a failed handshake never reaches the hub.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<GatewayState>,
) -> Response {
    let info = match auth::authenticate(&state.auth, &query) {
        Ok(info) => info,
        Err((status, reason)) => {
            warn!(role = query.role.as_str(), reason, "websocket handshake rejected");
            return (status, reason).into_response();
        }
    };
    ws.on_upgrade(move |socket| handle_socket(socket, state, info))
}

/// Drive one accepted connection until it closes.
async fn handle_socket(
    socket: WebSocket,
    state: GatewayState,
    info: parley_hub::dispatch::ConnectionInfo,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let connection_id = ConnectionId::generate();

    let (tx, mut rx) = mpsc::channel::<OutboundEvent>(OUTBOUND_BUFFER);
    state
        .hub
        .register_connection(connection_id.clone(), info, tx);
    debug!(connection = %connection_id, "websocket connection registered");

    // Forward hub events to the socket.
    let sender_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to encode outbound event");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Decode inbound frames and hand them to the hub.
    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => {
                let text_str: &str = &text;
                let event: InboundEvent = match serde_json::from_str(text_str) {
                    Ok(event) => event,
                    Err(err) => {
                        debug!(
                            connection = %connection_id,
                            error = %err,
                            "rejecting undecodable event frame"
                        );
                        state.hub.dispatcher().send(
                            &connection_id,
                            OutboundEvent::Error {
                                code: "validation".to_string(),
                                message: format!("unrecognized event: {err}"),
                            },
                        );
                        continue;
                    }
                };
                state.hub.handle_event(&connection_id, event).await;
            }
            Message::Close(_) => break,
            _ => {} // Ignore binary, ping (handled by the protocol layer)
        }
    }

    // Cleanup: unregister and let the hub re-enqueue anything this
    // connection held.
    state.hub.connection_closed(&connection_id).await;
    sender_task.abort();
    debug!(connection = %connection_id, "websocket connection closed");
}

#[cfg(test)]
mod tests {
    use parley_core::event::InboundEvent;

    #[test]
    fn inbound_frame_decodes_agent_listening() {
        let event: InboundEvent = serde_json::from_str(r#"{"type":"agent-listening"}"#).unwrap();
        assert_eq!(event, InboundEvent::AgentListening);
    }

    #[test]
    fn garbage_frame_fails_to_decode() {
        assert!(serde_json::from_str::<InboundEvent>("not json").is_err());
        assert!(serde_json::from_str::<InboundEvent>(r#"{"no":"type"}"#).is_err());
    }
}
