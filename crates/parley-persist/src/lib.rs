// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Archive sinks for ended conversations.
//!
//! The hub evicts a conversation from live state first and only then hands
//! it to a sink from a spawned task, so nothing here can block or roll back
//! a tenant actor. Sinks own their retry policy; the hub treats a returned
//! error as final and logs it.

pub mod http;
pub mod log;

pub use http::HttpArchiveSink;
pub use log::LogArchiveSink;
