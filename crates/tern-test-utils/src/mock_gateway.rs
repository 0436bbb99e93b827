// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted gateway that answers action requests written to a [`MockTransport`].

use std::collections::HashMap;

use serde_json::{Value, json};
use tern_core::UserId;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::frames::{SELF_ID, reply_failed, reply_ok};
use crate::mock_transport::MockTransport;

/// How the gateway answers one action.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Value),
    Failed { retcode: i64, message: String },
    /// Never answer.
    Silent,
}

/// Answers every request by action name. Unknown actions get `ok` with empty data.
pub struct MockGateway {
    transport: MockTransport,
    replies: HashMap<String, Reply>,
    fallback: Reply,
}

impl MockGateway {
    /// A gateway that identifies as [`SELF_ID`] / `TernBot`.
    pub fn new(transport: MockTransport) -> Self {
        Self {
            transport,
            replies: HashMap::new(),
            fallback: Reply::Ok(json!({})),
        }
        .with_identity(SELF_ID, "TernBot")
    }

    pub fn with_identity(self, user_id: UserId, nickname: &str) -> Self {
        self.with_reply(
            "get_login_info",
            json!({"user_id": user_id, "nickname": nickname}),
        )
    }

    pub fn with_reply(mut self, action: &str, data: Value) -> Self {
        self.replies.insert(action.to_string(), Reply::Ok(data));
        self
    }

    pub fn with_failure(mut self, action: &str, retcode: i64, message: &str) -> Self {
        self.replies.insert(
            action.to_string(),
            Reply::Failed {
                retcode,
                message: message.to_string(),
            },
        );
        self
    }

    pub fn with_silent(mut self, action: &str) -> Self {
        self.replies.insert(action.to_string(), Reply::Silent);
        self
    }

    /// Answer nothing unless scripted.
    pub fn silent_by_default(mut self) -> Self {
        self.fallback = Reply::Silent;
        self
    }

    fn answer(&self, request: &Value) -> Option<Value> {
        let action = request.get("action")?.as_str()?;
        let echo = request.get("echo")?;
        match self.replies.get(action).unwrap_or(&self.fallback) {
            Reply::Ok(data) => Some(reply_ok(echo, data.clone())),
            Reply::Failed { retcode, message } => Some(reply_failed(echo, *retcode, message)),
            Reply::Silent => None,
        }
    }

    /// Answer requests in the order they were written until the task is aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut seen = 0;
            loop {
                let sent = self.transport.wait_for_sent(seen + 1).await;
                for request in &sent[seen..] {
                    match self.answer(request) {
                        Some(reply) => self.transport.push(reply),
                        None => debug!(request = %request, "mock gateway left request unanswered"),
                    }
                }
                seen = sent.len();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_by_action() {
        let (transport, mock) = MockTransport::pair();
        let gateway = MockGateway::new(mock.clone())
            .with_failure("set_group_kick", 102, "no permission")
            .spawn();

        transport
            .send(json!({"action": "get_login_info", "params": {}, "echo": "t-1"}).to_string())
            .await
            .unwrap();
        let reply: Value = serde_json::from_str(&transport.receive().await.unwrap()).unwrap();
        assert_eq!(reply["echo"], "t-1");
        assert_eq!(reply["data"]["user_id"], SELF_ID);

        transport
            .send(json!({"action": "set_group_kick", "params": {}, "echo": "t-2"}).to_string())
            .await
            .unwrap();
        let reply: Value = serde_json::from_str(&transport.receive().await.unwrap()).unwrap();
        assert_eq!(reply["status"], "failed");
        assert_eq!(reply["retcode"], 102);

        gateway.abort();
    }
}
