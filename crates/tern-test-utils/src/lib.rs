// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tern integration tests.
//!
//! Provides an in-memory transport, a scripted gateway and a runtime harness
//! for fast, deterministic tests without a real OneBot gateway.
//!
//! # Components
//!
//! - [`MockTransport`] - In-memory transport with frame injection and capture
//! - [`MockGateway`] - Answers action requests by name
//! - [`TestHarness`] - A full runtime on a mock connection
//! - [`frames`] - Wire-format event and reply builders

pub mod frames;
pub mod harness;
pub mod mock_gateway;
pub mod mock_transport;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_gateway::{MockGateway, Reply};
pub use mock_transport::{MockConnector, MockTransport};
