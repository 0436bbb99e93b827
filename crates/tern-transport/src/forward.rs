// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dial-out mode: connect to the gateway's WebSocket server.

use std::sync::Arc;

use async_trait::async_trait;
use tern_core::{ConnectionMode, Connector, TernError, Transport};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::TransportConfig;
use crate::ws::{Incoming, WsMessage, WsTransport, spawn_pumps};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects out to `ws://host:port/path`, sending the access token as a bearer header.
#[derive(Debug, Clone)]
pub struct ForwardConnector {
    config: TransportConfig,
}

impl ForwardConnector {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// The URL this connector dials.
    pub fn url(&self) -> String {
        format!(
            "ws://{}:{}{}",
            self.config.host, self.config.port, self.config.path
        )
    }
}

#[async_trait]
impl Connector for ForwardConnector {
    fn mode(&self) -> ConnectionMode {
        ConnectionMode::Forward
    }

    async fn connect(&self) -> Result<Arc<dyn Transport>, TernError> {
        let url = self.url();
        let mut request = url.as_str().into_client_request().map_err(|e| TernError::Transport {
            message: format!("invalid gateway url {url}"),
            source: Some(Box::new(e)),
        })?;

        if let Some(token) = &self.config.access_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                TernError::Transport {
                    message: "access token is not a valid header value".into(),
                    source: Some(Box::new(e)),
                }
            })?;
            request.headers_mut().insert("authorization", value);
        }

        let (ws, _) = tokio::time::timeout(self.config.connect_timeout, connect_async(request))
            .await
            .map_err(|_| {
                TernError::transport(format!(
                    "connecting to {url} timed out after {:?}",
                    self.config.connect_timeout
                ))
            })?
            .map_err(|e| TernError::Transport {
                message: format!("failed to connect to {url}"),
                source: Some(Box::new(e)),
            })?;

        info!(url = %url, "connected to gateway");

        let (transport, ends) = WsTransport::new(ConnectionMode::Forward, CancellationToken::new());
        spawn_pumps::<WsStream, Message, _>(ws, ends, "forward");
        Ok(Arc::new(transport))
    }
}

impl WsMessage for Message {
    fn text(frame: String) -> Self {
        Message::Text(frame.into())
    }

    fn close() -> Self {
        Message::Close(None)
    }

    fn into_incoming(self) -> Incoming {
        match self {
            Message::Text(text) => Incoming::Text(text.as_str().to_string()),
            Message::Binary(bytes) => Incoming::Binary(bytes.to_vec()),
            Message::Close(frame) => Incoming::Closed(frame.map(|f| f.reason.as_str().to_string())),
            _ => Incoming::Skip,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config(path: &str) -> TransportConfig {
        TransportConfig {
            host: "127.0.0.1".into(),
            port: 9,
            path: path.into(),
            access_token: None,
            connect_timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn url_includes_path() {
        let c = ForwardConnector::new(config("/onebot/v11/ws"));
        assert_eq!(c.url(), "ws://127.0.0.1:9/onebot/v11/ws");
    }

    #[tokio::test]
    async fn pumps_relay_frames_until_the_peer_closes() {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::tungstenite::protocol::Role;

        let (local, remote) = tokio::io::duplex(4096);
        let local = WebSocketStream::from_raw_socket(local, Role::Server, None).await;
        let mut peer = WebSocketStream::from_raw_socket(remote, Role::Client, None).await;

        let cancel = CancellationToken::new();
        let (transport, ends) = WsTransport::new(ConnectionMode::Forward, cancel.clone());
        spawn_pumps::<_, Message, _>(local, ends, "forward");

        peer.send(Message::text("one")).await.unwrap();
        peer.send(Message::binary(b"two".to_vec())).await.unwrap();
        peer.send(Message::binary(vec![0xff, 0xfe])).await.unwrap();
        peer.send(Message::text("three")).await.unwrap();
        for expected in ["one", "two", "three"] {
            assert_eq!(transport.receive().await.as_deref(), Some(expected));
        }

        transport.send("out".into()).await.unwrap();
        assert_eq!(peer.next().await.unwrap().unwrap(), Message::text("out"));

        peer.close(None).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), cancel.cancelled())
            .await
            .expect("reader should stop on close");
        assert_eq!(transport.receive().await, None);
        assert!(transport.send("late".into()).await.is_err());
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let c = ForwardConnector::new(config("/"));
        let err = match c.connect().await {
            Ok(_) => panic!("nothing listens on port 9"),
            Err(e) => e,
        };
        assert!(matches!(err, TernError::Transport { .. }));
    }
}
