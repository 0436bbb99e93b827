// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Socket-agnostic half of a WebSocket transport.
//!
//! [`spawn_pumps`] runs a writer task and a reader task around any socket
//! whose message type implements [`WsMessage`], and talks to [`WsTransport`]
//! through two channels: outbound frames carry an acknowledgement slot so
//! write failures reach the caller, inbound frames are plain text.

use std::fmt::Display;

use async_trait::async_trait;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tern_core::{ConnectionMode, TernError, Transport};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Queue depth between callers and the writer task.
pub(crate) const OUTBOUND_CAPACITY: usize = 256;

/// Queue depth between the reader task and the runtime.
pub(crate) const INBOUND_CAPACITY: usize = 1024;

/// One frame waiting to be written, plus the slot that reports the outcome.
pub(crate) struct Outgoing {
    pub frame: String,
    pub ack: oneshot::Sender<Result<(), String>>,
}

/// Channel ends handed to the per-mode socket pumps.
pub(crate) struct PumpEnds {
    pub outbound: mpsc::Receiver<Outgoing>,
    pub inbound: mpsc::Sender<String>,
    pub cancel: CancellationToken,
}

/// An incoming socket message, reduced to what the reader acts on.
pub(crate) enum Incoming {
    Text(String),
    Binary(Vec<u8>),
    Closed(Option<String>),
    /// Ping, pong and raw frames.
    Skip,
}

/// Conversion between a socket library's message type and text frames.
pub(crate) trait WsMessage: Send + 'static {
    fn text(frame: String) -> Self;

    fn close() -> Self;

    fn into_incoming(self) -> Incoming;
}

/// Spawn the writer and reader tasks for `socket`.
///
/// Either task stopping cancels `ends.cancel`; cancellation makes the writer
/// send a close frame and the reader drop the inbound channel.
pub(crate) fn spawn_pumps<S, M, E>(socket: S, ends: PumpEnds, side: &'static str)
where
    S: Sink<M, Error = E> + Stream<Item = Result<M, E>> + Send + 'static,
    M: WsMessage,
    E: Display + Send + 'static,
{
    let PumpEnds {
        mut outbound,
        inbound,
        cancel,
    } = ends;
    let (mut sink, mut stream) = socket.split();

    let writer_cancel = cancel.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = writer_cancel.cancelled() => {
                    let _ = sink.send(M::close()).await;
                    break;
                }
                next = outbound.recv() => {
                    let Some(out) = next else { break };
                    let result = sink
                        .send(M::text(out.frame))
                        .await
                        .map_err(|e| e.to_string());
                    let failed = result.is_err();
                    let _ = out.ack.send(result);
                    if failed {
                        writer_cancel.cancel();
                        break;
                    }
                }
            }
        }
        debug!(side, "websocket writer stopped");
    });

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                msg = stream.next() => {
                    let text = match msg {
                        Some(Ok(msg)) => match msg.into_incoming() {
                            Incoming::Text(text) => text,
                            Incoming::Binary(bytes) => match String::from_utf8(bytes) {
                                Ok(text) => text,
                                Err(_) => {
                                    warn!(side, "dropping non-utf8 binary frame");
                                    continue;
                                }
                            },
                            Incoming::Closed(reason) => {
                                info!(side, ?reason, "gateway closed the connection");
                                break;
                            }
                            Incoming::Skip => continue,
                        },
                        Some(Err(e)) => {
                            warn!(side, error = %e, "websocket read failed");
                            break;
                        }
                        None => {
                            info!(side, "gateway disconnected");
                            break;
                        }
                    };
                    if inbound.send(text).await.is_err() {
                        break;
                    }
                }
            }
        }
        cancel.cancel();
        debug!(side, "websocket reader stopped");
    });
}

/// A live WebSocket connection, independent of which side opened it.
pub struct WsTransport {
    mode: ConnectionMode,
    outbound: mpsc::Sender<Outgoing>,
    inbound: Mutex<mpsc::Receiver<String>>,
    cancel: CancellationToken,
}

impl WsTransport {
    /// Create the transport and the channel ends its socket pumps will use.
    pub(crate) fn new(mode: ConnectionMode, cancel: CancellationToken) -> (Self, PumpEnds) {
        let (out_tx, out_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let (in_tx, in_rx) = mpsc::channel(INBOUND_CAPACITY);
        let transport = Self {
            mode,
            outbound: out_tx,
            inbound: Mutex::new(in_rx),
            cancel: cancel.clone(),
        };
        let ends = PumpEnds {
            outbound: out_rx,
            inbound: in_tx,
            cancel,
        };
        (transport, ends)
    }

    /// Token cancelled once the connection is closed from either side.
    pub fn closed(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[async_trait]
impl Transport for WsTransport {
    fn mode(&self) -> ConnectionMode {
        self.mode
    }

    async fn send(&self, frame: String) -> Result<(), TernError> {
        if self.cancel.is_cancelled() {
            return Err(TernError::transport("connection closed"));
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        self.outbound
            .send(Outgoing { frame, ack: ack_tx })
            .await
            .map_err(|_| TernError::transport("writer task stopped"))?;

        match ack_rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(TernError::transport(message)),
            Err(_) => Err(TernError::transport("connection closed before write")),
        }
    }

    async fn receive(&self) -> Option<String> {
        self.inbound.lock().await.recv().await
    }

    async fn close(&self) -> Result<(), TernError> {
        if !self.cancel.is_cancelled() {
            debug!(mode = %self.mode, "closing websocket transport");
            self.cancel.cancel();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_reports_write_failure_from_pump() {
        let (transport, mut ends) = WsTransport::new(ConnectionMode::Forward, CancellationToken::new());
        tokio::spawn(async move {
            if let Some(out) = ends.outbound.recv().await {
                let _ = out.ack.send(Err("broken pipe".into()));
            }
        });
        let err = transport.send("{}".into()).await.unwrap_err();
        assert!(err.to_string().contains("broken pipe"));
    }

    #[tokio::test]
    async fn send_after_close_fails_fast() {
        let (transport, _ends) = WsTransport::new(ConnectionMode::Reverse, CancellationToken::new());
        transport.close().await.unwrap();
        assert!(transport.send("{}".into()).await.is_err());
    }

    #[tokio::test]
    async fn receive_yields_frames_then_none() {
        let (transport, ends) = WsTransport::new(ConnectionMode::Forward, CancellationToken::new());
        ends.inbound.send("a".into()).await.unwrap();
        drop(ends);
        assert_eq!(transport.receive().await.as_deref(), Some("a"));
        assert_eq!(transport.receive().await, None);
    }
}
