// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory transport for deterministic testing.
//!
//! [`MockTransport::pair`] returns the runtime-facing [`Transport`] and a
//! test-facing handle. Frames the runtime writes are captured (parsed as
//! JSON) for assertions; frames pushed through the handle come out of
//! `receive()` in order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tern_core::{ConnectionMode, Connector, TernError, Transport};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

struct Shared {
    mode: ConnectionMode,
    sent: Mutex<Vec<Value>>,
    sent_count: watch::Sender<usize>,
    inbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    fail_writes: AtomicBool,
    closed: CancellationToken,
}

/// Test-side handle of an in-memory transport.
#[derive(Clone)]
pub struct MockTransport {
    shared: Arc<Shared>,
}

struct MockTransportEnd {
    shared: Arc<Shared>,
    inbound: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
}

impl MockTransport {
    /// A forward-mode transport and its test handle.
    pub fn pair() -> (Arc<dyn Transport>, MockTransport) {
        Self::pair_with_mode(ConnectionMode::Forward)
    }

    pub fn pair_with_mode(mode: ConnectionMode) -> (Arc<dyn Transport>, MockTransport) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (sent_count, _) = watch::channel(0);
        let shared = Arc::new(Shared {
            mode,
            sent: Mutex::new(Vec::new()),
            sent_count,
            inbound: Mutex::new(Some(tx)),
            fail_writes: AtomicBool::new(false),
            closed: CancellationToken::new(),
        });
        let end = MockTransportEnd {
            shared: shared.clone(),
            inbound: tokio::sync::Mutex::new(rx),
        };
        (Arc::new(end), MockTransport { shared })
    }

    /// Every frame written so far.
    pub fn sent(&self) -> Vec<Value> {
        self.shared
            .sent
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn sent_count(&self) -> usize {
        *self.shared.sent_count.borrow()
    }

    /// Wait until at least `count` frames were written, then return all of them.
    pub async fn wait_for_sent(&self, count: usize) -> Vec<Value> {
        let mut rx = self.shared.sent_count.subscribe();
        // The sender lives in `shared`, so the channel cannot close under us.
        let _ = rx.wait_for(|n| *n >= count).await;
        self.sent()
    }

    /// Deliver a frame to the runtime.
    pub fn push(&self, frame: Value) {
        self.push_text(frame.to_string());
    }

    pub fn push_text(&self, text: impl Into<String>) {
        if let Ok(guard) = self.shared.inbound.lock()
            && let Some(tx) = guard.as_ref()
        {
            let _ = tx.send(text.into());
        }
    }

    /// Make every later write fail with a transport error.
    pub fn fail_writes(&self, fail: bool) {
        self.shared.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Simulate the gateway dropping the connection.
    pub fn disconnect(&self) {
        if let Ok(mut guard) = self.shared.inbound.lock() {
            guard.take();
        }
    }

    /// Whether the runtime closed its side.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.is_cancelled()
    }
}

#[async_trait]
impl Transport for MockTransportEnd {
    fn mode(&self) -> ConnectionMode {
        self.shared.mode
    }

    async fn send(&self, frame: String) -> Result<(), TernError> {
        if self.shared.closed.is_cancelled() {
            return Err(TernError::transport("mock transport closed"));
        }
        if self.shared.fail_writes.load(Ordering::SeqCst) {
            return Err(TernError::transport("simulated write failure"));
        }
        let value = serde_json::from_str(&frame).unwrap_or(Value::String(frame));
        let count = match self.shared.sent.lock() {
            Ok(mut sent) => {
                sent.push(value);
                sent.len()
            }
            Err(_) => return Err(TernError::Internal("mock transport poisoned".into())),
        };
        self.shared.sent_count.send_replace(count);
        Ok(())
    }

    async fn receive(&self) -> Option<String> {
        let mut inbound = self.inbound.lock().await;
        tokio::select! {
            _ = self.shared.closed.cancelled() => None,
            frame = inbound.recv() => frame,
        }
    }

    async fn close(&self) -> Result<(), TernError> {
        self.shared.closed.cancel();
        Ok(())
    }
}

/// Hands out one pre-built transport, or fails.
pub struct MockConnector {
    mode: ConnectionMode,
    transport: Mutex<Option<Arc<dyn Transport>>>,
    failure: Option<String>,
}

impl MockConnector {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            mode: transport.mode(),
            transport: Mutex::new(Some(transport)),
            failure: None,
        }
    }

    /// A connector whose `connect` always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            mode: ConnectionMode::Forward,
            transport: Mutex::new(None),
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl Connector for MockConnector {
    fn mode(&self) -> ConnectionMode {
        self.mode
    }

    async fn connect(&self) -> Result<Arc<dyn Transport>, TernError> {
        if let Some(message) = &self.failure {
            return Err(TernError::transport(message.clone()));
        }
        self.transport
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .ok_or_else(|| TernError::transport("mock connector already used"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn captures_writes_and_delivers_pushes() {
        let (transport, mock) = MockTransport::pair();
        transport.send(r#"{"action":"x"}"#.into()).await.unwrap();
        assert_eq!(mock.wait_for_sent(1).await[0]["action"], "x");

        mock.push(json!({"post_type": "meta_event"}));
        let text = transport.receive().await.unwrap();
        assert!(text.contains("meta_event"));
    }

    #[tokio::test]
    async fn disconnect_ends_receive() {
        let (transport, mock) = MockTransport::pair();
        mock.disconnect();
        assert!(transport.receive().await.is_none());
    }

    #[tokio::test]
    async fn close_ends_receive_and_rejects_writes() {
        let (transport, mock) = MockTransport::pair();
        transport.close().await.unwrap();
        assert!(mock.is_closed());
        assert!(transport.receive().await.is_none());
        assert!(transport.send("{}".into()).await.is_err());
    }

    #[tokio::test]
    async fn connector_hands_out_once() {
        let (transport, _mock) = MockTransport::pair();
        let connector = MockConnector::new(transport);
        assert!(connector.connect().await.is_ok());
        assert!(connector.connect().await.is_err());
        assert!(MockConnector::failing("refused").connect().await.is_err());
    }
}
