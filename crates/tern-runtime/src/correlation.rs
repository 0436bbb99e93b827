// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Echo-keyed request/reply correlation over one shared socket.
//!
//! Every outbound action gets a fresh `echo` token and a pending slot in a
//! concurrent map. The reader loop hands every inbound frame to
//! [`ActionClient::route_frame`], which resolves the slot whose token matches
//! and nothing else. Any number of calls may be in flight at once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tern_core::{ActionError, ActionRequest, ActionResponse, FrameKind, Transport};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

/// Default bound on waiting for a reply.
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(10);

struct PendingRequest {
    action: String,
    created: Instant,
    slot: oneshot::Sender<ActionResponse>,
}

/// What the correlation layer did with an inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    /// An event frame for the classifier.
    Event(Value),
    /// A reply that fulfilled a pending request.
    Reply,
    /// A heartbeat or lifecycle frame, dropped.
    Meta,
    /// A reply for an unknown or already-consumed token, or an unrecognised frame.
    Discarded,
}

/// Sends actions and matches their replies.
pub struct ActionClient {
    transport: Arc<dyn Transport>,
    pending: DashMap<String, PendingRequest>,
    next_echo: AtomicU64,
    prefix: String,
    timeout: Duration,
    closed: AtomicBool,
}

impl ActionClient {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        let prefix = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        Self {
            transport,
            pending: DashMap::new(),
            next_echo: AtomicU64::new(1),
            prefix,
            timeout,
            closed: AtomicBool::new(false),
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of requests currently awaiting a reply.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn next_token(&self) -> String {
        let n = self.next_echo.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n}", self.prefix)
    }

    /// Send `action` and wait for its reply's `data`.
    pub async fn call(&self, action: &str, params: Value) -> Result<Value, ActionError> {
        if self.is_closed() {
            return Err(ActionError::Closed);
        }

        let echo = self.next_token();
        let frame = ActionRequest {
            action: action.to_string(),
            params,
            echo: Some(echo.clone()),
        };
        let text = serde_json::to_string(&frame).map_err(|e| ActionError::Decode {
            message: format!("failed to encode `{action}`: {e}"),
        })?;

        // Reserved before the write, withdrawn if the write fails.
        let (tx, rx) = oneshot::channel();
        self.pending.insert(
            echo.clone(),
            PendingRequest {
                action: action.to_string(),
                created: Instant::now(),
                slot: tx,
            },
        );

        trace!(action, echo = %echo, "sending action");
        if let Err(e) = self.transport.send(text).await {
            self.pending.remove(&echo);
            warn!(action, error = %e, "action write failed");
            return Err(ActionError::Transport {
                message: e.to_string(),
            });
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => response.into_result(action),
            Ok(Err(_)) => Err(ActionError::Closed),
            Err(_) => {
                self.pending.remove(&echo);
                warn!(action, echo = %echo, timeout = ?self.timeout, "action timed out");
                Err(ActionError::Timeout {
                    action: action.to_string(),
                    duration: self.timeout,
                })
            }
        }
    }

    /// Like [`call`](Self::call), decoding `data` into `T`.
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Value,
    ) -> Result<T, ActionError> {
        let data = self.call(action, params).await?;
        serde_json::from_value(data).map_err(|e| ActionError::Decode {
            message: format!("`{action}` reply: {e}"),
        })
    }

    /// Parse one raw text frame and route it.
    pub fn route_text(&self, text: &str) -> Routed {
        match serde_json::from_str::<Value>(text) {
            Ok(frame) => self.route_frame(frame),
            Err(e) => {
                warn!(error = %e, "discarding frame that is not valid JSON");
                Routed::Discarded
            }
        }
    }

    /// Demultiplex one inbound frame.
    pub fn route_frame(&self, frame: Value) -> Routed {
        match FrameKind::of(&frame) {
            FrameKind::Meta => {
                let kind = frame
                    .get("meta_event_type")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                trace!(kind, "meta frame");
                Routed::Meta
            }
            FrameKind::Event => Routed::Event(frame),
            FrameKind::Reply => self.fulfil(frame),
            FrameKind::Unknown => {
                warn!("discarding frame with neither post_type nor reply fields");
                Routed::Discarded
            }
        }
    }

    fn fulfil(&self, frame: Value) -> Routed {
        let response: ActionResponse = match serde_json::from_value(frame) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "discarding malformed reply frame");
                return Routed::Discarded;
            }
        };

        let Some(echo) = response.echo_key() else {
            warn!(status = %response.status, "discarding reply without echo");
            return Routed::Discarded;
        };

        match self.pending.remove(&echo) {
            Some((_, pending)) => {
                debug!(
                    action = %pending.action,
                    echo = %echo,
                    elapsed_ms = pending.created.elapsed().as_millis() as u64,
                    "reply received"
                );
                if pending.slot.send(response).is_err() {
                    debug!(echo = %echo, "caller stopped waiting before reply arrived");
                }
                Routed::Reply
            }
            None => {
                warn!(echo = %echo, "discarding reply for unknown or stale echo");
                Routed::Discarded
            }
        }
    }

    /// Fail every pending request with [`ActionError::Closed`] and refuse new ones.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        let count = self.pending.len();
        self.pending.clear();
        if count > 0 {
            debug!(count, "dropped pending requests on close");
        }
    }
}
