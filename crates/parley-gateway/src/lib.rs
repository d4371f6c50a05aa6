// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the Parley routing hub.
//!
//! One physical WebSocket connection per agent client and per channel
//! adapter instance, authenticated during the handshake. Inbound frames are
//! decoded into protocol events at this boundary; outbound events are
//! serialized back onto the owning socket.

pub mod auth;
pub mod handlers;
pub mod server;
pub mod ws;

pub use auth::AuthConfig;
pub use server::{start_server, GatewayState, HealthState, ServerConfig};
