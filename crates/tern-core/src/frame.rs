// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire frames exchanged with the gateway.
//!
//! Outbound:
//! ```json
//! {"action": "send_private_msg", "params": {"user_id": 1, "message": "hi"}, "echo": "a1b2-7"}
//! ```
//!
//! Inbound reply:
//! ```json
//! {"status": "ok", "retcode": 0, "data": {"message_id": 5}, "echo": "a1b2-7"}
//! ```
//!
//! Inbound events carry `post_type` instead of `status`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ActionError;

/// An outbound action request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echo: Option<String>,
}

/// A reply to a previously sent action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub retcode: i64,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub wording: Option<String>,
    #[serde(default)]
    pub echo: Option<Value>,
}

impl ActionResponse {
    /// The correlation token in canonical string form.
    pub fn echo_key(&self) -> Option<String> {
        self.echo.as_ref().and_then(echo_to_key)
    }

    /// `ok` and `async` with retcode 0 (or 1 for async) are success.
    pub fn is_success(&self) -> bool {
        match self.status.as_str() {
            "ok" => self.retcode == 0,
            "async" => self.retcode == 0 || self.retcode == 1,
            _ => false,
        }
    }

    /// Convert into the handler-facing result for `action`.
    pub fn into_result(self, action: &str) -> Result<Value, ActionError> {
        if self.is_success() {
            return Ok(self.data);
        }
        let message = self
            .message
            .filter(|m| !m.is_empty())
            .or(self.wording)
            .unwrap_or_else(|| format!("status `{}`", self.status));
        Err(ActionError::Protocol {
            action: action.to_string(),
            retcode: self.retcode,
            message,
        })
    }
}

/// Normalise an `echo` value to the string key used for correlation.
pub fn echo_to_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coarse shape of an inbound frame, decided from its discriminator fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// `post_type` is `meta_event` (heartbeat, lifecycle).
    Meta,
    /// Any other `post_type`.
    Event,
    /// No `post_type` but reply fields present.
    Reply,
    /// Neither an event nor a reply.
    Unknown,
}

impl FrameKind {
    pub fn of(frame: &Value) -> Self {
        match frame.get("post_type").and_then(Value::as_str) {
            Some("meta_event") => FrameKind::Meta,
            Some(_) => FrameKind::Event,
            None if frame.get("meta_event_type").is_some() => FrameKind::Meta,
            None if frame.get("echo").is_some()
                || frame.get("status").is_some()
                || frame.get("retcode").is_some() =>
            {
                FrameKind::Reply
            }
            None => FrameKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_omits_missing_echo() {
        let req = ActionRequest {
            action: "get_status".into(),
            params: json!({}),
            echo: None,
        };
        let v = serde_json::to_value(req).unwrap();
        assert!(v.get("echo").is_none());
    }

    #[test]
    fn failed_reply_becomes_protocol_error() {
        let resp: ActionResponse = serde_json::from_value(json!({
            "status": "failed", "retcode": 1404, "data": null, "message": "no such group", "echo": "x-1"
        }))
        .unwrap();
        let err = resp.into_result("get_group_info").unwrap_err();
        assert_eq!(
            err,
            ActionError::Protocol {
                action: "get_group_info".into(),
                retcode: 1404,
                message: "no such group".into()
            }
        );
    }

    #[test]
    fn ok_reply_yields_data() {
        let resp: ActionResponse = serde_json::from_value(json!({
            "status": "ok", "retcode": 0, "data": {"message_id": 3}, "echo": 17
        }))
        .unwrap();
        assert_eq!(resp.echo_key().as_deref(), Some("17"));
        assert_eq!(resp.into_result("send_msg").unwrap(), json!({"message_id": 3}));
    }

    #[test]
    fn frame_kinds() {
        assert_eq!(
            FrameKind::of(&json!({"post_type": "meta_event", "meta_event_type": "heartbeat"})),
            FrameKind::Meta
        );
        assert_eq!(FrameKind::of(&json!({"post_type": "message"})), FrameKind::Event);
        assert_eq!(FrameKind::of(&json!({"status": "ok", "echo": "1"})), FrameKind::Reply);
        assert_eq!(FrameKind::of(&json!({"hello": 1})), FrameKind::Unknown);
    }
}
