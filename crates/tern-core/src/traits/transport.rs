// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport traits for the duplex socket to the gateway.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TernError;
use crate::types::ConnectionMode;

/// One established duplex connection carrying JSON text frames.
///
/// Implementations must allow `send` to be called concurrently from many
/// tasks while a single reader task drives `receive`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Which side opened the connection.
    fn mode(&self) -> ConnectionMode;

    /// Writes one text frame. Resolves once the frame was handed to the socket.
    async fn send(&self, frame: String) -> Result<(), TernError>;

    /// Next inbound text frame, or `None` once the connection is closed.
    async fn receive(&self) -> Option<String>;

    /// Closes the connection. Idempotent.
    async fn close(&self) -> Result<(), TernError>;
}

/// Establishes a [`Transport`] according to the configured connection mode.
#[async_trait]
pub trait Connector: Send + Sync {
    fn mode(&self) -> ConnectionMode;

    /// Dials the gateway or waits for it to connect, depending on the mode.
    async fn connect(&self) -> Result<Arc<dyn Transport>, TernError>;
}
