// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket transports for the Tern gateway client.
//!
//! Two connection modes produce the same [`WsTransport`]:
//! - [`ForwardConnector`] dials the gateway (`ws://host:port/path`) with a bearer header.
//! - [`ReverseConnector`] listens and accepts exactly one gateway connection.

pub mod auth;
pub mod forward;
pub mod reverse;
pub mod ws;

use std::sync::Arc;
use std::time::Duration;

use tern_config::model::ConnectionConfig;
use tern_core::{ConnectionMode, Connector};

pub use forward::ForwardConnector;
pub use reverse::ReverseConnector;
pub use ws::WsTransport;

/// Connection parameters shared by both modes.
#[derive(Clone)]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub access_token: Option<String>,
    pub connect_timeout: Duration,
}

impl std::fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("path", &self.path)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl From<&ConnectionConfig> for TransportConfig {
    fn from(config: &ConnectionConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            path: config.path.clone(),
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
        }
    }
}

/// Build the connector for the configured mode.
pub fn connector_from_config(config: &ConnectionConfig) -> Arc<dyn Connector> {
    let transport = TransportConfig::from(config);
    match config.mode {
        ConnectionMode::Forward => Arc::new(ForwardConnector::new(transport)),
        ConnectionMode::Reverse => Arc::new(ReverseConnector::new(transport)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let mut conn = ConnectionConfig::default();
        conn.access_token = Some("hunter2".into());
        let rendered = format!("{:?}", TransportConfig::from(&conn));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[redacted]"));
    }

    #[test]
    fn empty_token_is_treated_as_none() {
        let mut conn = ConnectionConfig::default();
        conn.access_token = Some(String::new());
        assert!(TransportConfig::from(&conn).access_token.is_none());
    }

    #[test]
    fn connector_matches_mode() {
        let mut conn = ConnectionConfig::default();
        assert_eq!(connector_from_config(&conn).mode(), ConnectionMode::Forward);
        conn.mode = ConnectionMode::Reverse;
        assert_eq!(connector_from_config(&conn).mode(), ConnectionMode::Reverse);
    }
}
