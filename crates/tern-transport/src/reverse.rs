// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Accept mode: listen on host:port and take exactly one connection from the gateway.
//!
//! The listener keeps running for the lifetime of the accepted connection so
//! that a second gateway attempting to connect gets a clear `409 Conflict`
//! instead of a refused socket.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use tern_core::{ConnectionMode, Connector, TernError, Transport};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::TransportConfig;
use crate::auth::{TokenQuery, check_token};
use crate::ws::{Incoming, WsMessage, WsTransport, spawn_pumps};

#[derive(Clone)]
struct AcceptState {
    access_token: Option<String>,
    slot: Arc<Mutex<Option<oneshot::Sender<WebSocket>>>>,
}

/// Waits for the gateway to dial in.
pub struct ReverseConnector {
    config: TransportConfig,
    listener: Mutex<Option<TcpListener>>,
}

impl ReverseConnector {
    /// Create a connector that binds lazily when `connect` is called.
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            listener: Mutex::new(None),
        }
    }

    /// Bind immediately, so the chosen address is known before `connect`.
    pub async fn bind(config: TransportConfig) -> Result<(Self, SocketAddr), TernError> {
        let listener = bind_listener(&config).await?;
        let addr = listener.local_addr().map_err(|e| TernError::Transport {
            message: "failed to read listener address".into(),
            source: Some(Box::new(e)),
        })?;
        Ok((
            Self {
                config,
                listener: Mutex::new(Some(listener)),
            },
            addr,
        ))
    }
}

async fn bind_listener(config: &TransportConfig) -> Result<TcpListener, TernError> {
    let addr = format!("{}:{}", config.host, config.port);
    TcpListener::bind(&addr)
        .await
        .map_err(|e| TernError::Transport {
            message: format!("failed to bind {addr}"),
            source: Some(Box::new(e)),
        })
}

#[async_trait]
impl Connector for ReverseConnector {
    fn mode(&self) -> ConnectionMode {
        ConnectionMode::Reverse
    }

    async fn connect(&self) -> Result<Arc<dyn Transport>, TernError> {
        let listener = match self.listener.lock().await.take() {
            Some(listener) => listener,
            None => bind_listener(&self.config).await?,
        };
        let local = listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "?".into());

        let (socket_tx, socket_rx) = oneshot::channel();
        let state = AcceptState {
            access_token: self.config.access_token.clone(),
            slot: Arc::new(Mutex::new(Some(socket_tx))),
        };
        let app = Router::new()
            .route(&self.config.path, get(ws_handler))
            .with_state(state);

        let cancel = CancellationToken::new();
        let server_cancel = cancel.clone();
        let server = tokio::spawn(async move {
            let shutdown = server_cancel.cancelled_owned();
            if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
                warn!(error = %e, "accept server stopped with error");
            }
        });

        info!(addr = %local, path = %self.config.path, "waiting for gateway to connect");

        let socket = match socket_rx.await {
            Ok(socket) => socket,
            Err(_) => {
                cancel.cancel();
                server.abort();
                return Err(TernError::transport("accept server stopped before a gateway connected"));
            }
        };

        info!(addr = %local, "gateway connected");

        let (transport, ends) = WsTransport::new(ConnectionMode::Reverse, cancel);
        spawn_pumps::<WebSocket, Message, _>(socket, ends, "reverse");
        Ok(Arc::new(transport))
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
    State(state): State<AcceptState>,
) -> Response {
    if !check_token(state.access_token.as_deref(), &headers, &query) {
        warn!("rejecting gateway connection with missing or wrong access token");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let Some(tx) = state.slot.lock().await.take() else {
        warn!("rejecting second gateway connection, one is already active");
        return StatusCode::CONFLICT.into_response();
    };

    ws.on_upgrade(move |socket| async move {
        if tx.send(socket).is_err() {
            debug!("connector went away before the upgrade completed");
        }
    })
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
