// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Overlay connection settings from the gateway's own `appsettings.json`.
//!
//! The gateway describes its WebSocket implementations from its own point of
//! view: a `ReverseWebSocket` implementation dials *out*, which means this
//! client has to listen (reverse mode). Anything else is treated as a
//! gateway-side server that we dial (forward mode).

use std::path::Path;

use serde::Deserialize;
use tern_core::ConnectionMode;
use tracing::debug;

use crate::diagnostic::ConfigError;
use crate::model::ConnectionConfig;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AppSettings {
    #[serde(default)]
    implementations: Vec<Implementation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Implementation {
    #[serde(rename = "Type")]
    kind: String,
    host: String,
    port: u16,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    suffix: Option<String>,
}

/// Apply the first implementation found in `path` onto `connection`.
pub fn apply_appsettings(connection: &mut ConnectionConfig, path: &Path) -> Result<(), ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::validation(format!(
            "connection.appsettings_path `{}` could not be read: {e}",
            path.display()
        ))
    })?;
    apply_appsettings_str(connection, &content)
        .map_err(|message| ConfigError::validation(format!("{}: {message}", path.display())))
}

/// Apply an `appsettings.json` document held in memory.
pub fn apply_appsettings_str(
    connection: &mut ConnectionConfig,
    content: &str,
) -> Result<(), String> {
    let settings: AppSettings =
        serde_json::from_str(content).map_err(|e| format!("invalid appsettings.json: {e}"))?;

    let implementation = settings
        .implementations
        .into_iter()
        .next()
        .ok_or_else(|| "appsettings.json declares no Implementations".to_string())?;

    connection.mode = if implementation.kind == "ReverseWebSocket" {
        ConnectionMode::Reverse
    } else {
        ConnectionMode::Forward
    };
    connection.host = implementation.host;
    connection.port = implementation.port;
    if let Some(token) = implementation.access_token.filter(|t| !t.is_empty()) {
        connection.access_token = Some(token);
    }
    if let Some(suffix) = implementation.suffix.filter(|s| !s.is_empty()) {
        connection.path = suffix;
    }

    debug!(
        mode = %connection.mode,
        host = %connection.host,
        port = connection.port,
        "applied gateway appsettings"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_websocket_means_we_listen() {
        let mut conn = ConnectionConfig::default();
        let json = r#"{"Implementations":[{"Type":"ReverseWebSocket","Host":"0.0.0.0","Port":8081,"Suffix":"/onebot/v11/ws","AccessToken":"s3cret"}]}"#;
        apply_appsettings_str(&mut conn, json).unwrap();
        assert_eq!(conn.mode, ConnectionMode::Reverse);
        assert_eq!(conn.host, "0.0.0.0");
        assert_eq!(conn.port, 8081);
        assert_eq!(conn.path, "/onebot/v11/ws");
        assert_eq!(conn.access_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn forward_websocket_means_we_dial() {
        let mut conn = ConnectionConfig::default();
        conn.mode = ConnectionMode::Reverse;
        let json = r#"{"Implementations":[{"Type":"ForwardWebSocket","Host":"10.0.0.2","Port":9000,"AccessToken":""}]}"#;
        apply_appsettings_str(&mut conn, json).unwrap();
        assert_eq!(conn.mode, ConnectionMode::Forward);
        assert_eq!(conn.port, 9000);
        assert!(conn.access_token.is_none());
        assert_eq!(conn.path, "/");
    }

    #[test]
    fn empty_implementations_is_an_error() {
        let mut conn = ConnectionConfig::default();
        let err = apply_appsettings_str(&mut conn, r#"{"Implementations":[]}"#).unwrap_err();
        assert!(err.contains("no Implementations"));
    }

    #[test]
    fn missing_file_is_a_validation_error() {
        let mut conn = ConnectionConfig::default();
        let err = apply_appsettings(&mut conn, Path::new("/nonexistent/appsettings.json"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }
}
