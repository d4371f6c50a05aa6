// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parley integration tests.
//!
//! Provides [`HubHarness`] for driving a full routing hub with mock
//! connections and a capturing archive sink.

pub mod capture_sink;
pub mod harness;
pub mod mock_connection;

pub use capture_sink::CaptureArchiveSink;
pub use harness::HubHarness;
pub use mock_connection::MockConnection;
