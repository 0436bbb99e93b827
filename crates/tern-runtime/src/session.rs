// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-dispatch session context handed to handlers, plugins and hooks.
//!
//! A [`SessionContext`] wraps one event and a `finished` flag. Every outbound
//! action goes through [`SessionContext::call`], which refuses locally once the
//! session is finished, so a handler that ended its session can never write
//! to the socket by accident. The catalog of named actions lives in
//! [`crate::actions`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tern_core::{
    Action, ActionError, Identity, InboundEvent, MessageBody, MessageEvent, MetaEvent, UserId,
};
use tracing::warn;

use crate::connection::Connection;
use crate::history::HistoryStore;

/// One event plus the handle needed to act on it.
pub struct SessionContext {
    event: InboundEvent,
    finished: bool,
    conn: Arc<Connection>,
    history: Arc<HistoryStore>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("event", &self.event)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    pub fn new(event: InboundEvent, conn: Arc<Connection>, history: Arc<HistoryStore>) -> Self {
        Self {
            event,
            finished: false,
            conn,
            history,
        }
    }

    /// A context with no inbound event, for identify, hooks and scheduled jobs.
    pub fn bootstrap(conn: Arc<Connection>, history: Arc<HistoryStore>) -> Self {
        let mut meta = MetaEvent::bootstrap();
        if let Some(id) = conn.self_id() {
            meta.self_id = id;
        }
        Self::new(InboundEvent::Meta(meta), conn, history)
    }

    pub fn event(&self) -> &InboundEvent {
        &self.event
    }

    pub fn event_mut(&mut self) -> &mut InboundEvent {
        &mut self.event
    }

    pub fn into_event(self) -> InboundEvent {
        self.event
    }

    /// The message payload, for message events.
    pub fn message(&self) -> Option<&MessageEvent> {
        self.event.as_message()
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.conn
    }

    /// End the session. Later action calls fail with [`ActionError::SessionEnded`].
    pub fn finish_session(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Swap in a new event and reopen the session.
    pub fn update(&mut self, event: InboundEvent) {
        self.event = event;
        self.finished = false;
    }

    /// Recent events buffered for this event's scope, oldest first.
    ///
    /// Empty unless the scope's registration asked for a history buffer.
    pub fn history(&self) -> Vec<InboundEvent> {
        self.history
            .snapshot(self.event.scope())
            .unwrap_or_default()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.conn.identity()
    }

    pub fn self_id(&self) -> Option<UserId> {
        self.conn.self_id()
    }

    pub fn nickname(&self) -> Option<&str> {
        self.conn.identity().map(|i| i.nickname.as_str())
    }

    /// The text segments of the message joined by `delimiter`.
    pub fn raw_text(&self, delimiter: &str) -> String {
        match self.message() {
            Some(m) => m
                .message
                .iter()
                .filter_map(|s| s.as_text())
                .collect::<Vec<_>>()
                .join(delimiter),
            None => String::new(),
        }
    }

    /// Profile picture URL for `user_id`.
    pub fn user_avatar_url(user_id: UserId) -> String {
        format!("https://q1.qlogo.cn/g?b=qq&nk={user_id}&s=640")
    }

    /// Send `action` through the connection unless the session is finished.
    pub async fn call(&self, action: Action, params: Value) -> Result<Value, ActionError> {
        if self.finished {
            warn!(
                action = action.as_str(),
                scope = %self.event.scope(),
                "action refused, session already finished"
            );
            return Err(ActionError::SessionEnded {
                action: action.as_str().to_string(),
            });
        }
        self.conn.client().call(action.as_str(), params).await
    }

    /// Like [`call`](Self::call), decoding the reply data into `T`.
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        action: Action,
        params: Value,
    ) -> Result<T, ActionError> {
        let data = self.call(action, params).await?;
        serde_json::from_value(data).map_err(|e| ActionError::Decode {
            message: format!("`{action}` reply: {e}"),
        })
    }

    /// Reply to wherever the current event came from.
    ///
    /// Returns `None` for events with no conversation to answer (add requests
    /// and bootstrap contexts).
    pub async fn send_message(
        &self,
        message: impl Into<MessageBody> + Send,
    ) -> Option<Result<Value, ActionError>> {
        let message = message.into();
        match &self.event {
            InboundEvent::PrivateMessage(m) => Some(self.send_private_msg(m.user_id, message).await),
            InboundEvent::GroupMessage(m) => Some(match m.group_id {
                Some(group_id) => self.send_group_msg(group_id, message).await,
                None => self.send_private_msg(m.user_id, message).await,
            }),
            InboundEvent::GroupIncrease(n) => Some(self.send_group_msg(n.group_id, message).await),
            InboundEvent::OfflineFile(n) => Some(self.send_private_msg(n.user_id, message).await),
            InboundEvent::AddRequest(_) | InboundEvent::Meta(_) => {
                warn!(
                    category = ?self.event.category(),
                    "send_message has no conversation to reply to for this event"
                );
                None
            }
        }
    }
}
