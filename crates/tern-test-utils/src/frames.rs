// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for gateway frames as they appear on the wire.

use serde_json::{Value, json};
use tern_core::{GroupId, UserId};

/// Self id stamped on every built event.
pub const SELF_ID: UserId = 10;

pub fn private_message(user_id: UserId, text: &str) -> Value {
    json!({
        "post_type": "message",
        "message_type": "private",
        "sub_type": "friend",
        "time": 1_700_000_000,
        "self_id": SELF_ID,
        "message_id": 1,
        "user_id": user_id,
        "message": [{"type": "text", "data": {"text": text}}],
        "raw_message": text,
        "font": 0,
        "sender": {"user_id": user_id, "nickname": format!("user{user_id}")},
    })
}

pub fn group_message(group_id: GroupId, user_id: UserId, text: &str) -> Value {
    group_message_segments(
        group_id,
        user_id,
        json!([{"type": "text", "data": {"text": text}}]),
        text,
    )
}

/// A group message that mentions `target` before `text`.
pub fn group_mention(group_id: GroupId, user_id: UserId, target: UserId, text: &str) -> Value {
    group_message_segments(
        group_id,
        user_id,
        json!([
            {"type": "at", "data": {"qq": target.to_string()}},
            {"type": "text", "data": {"text": format!(" {text}")}},
        ]),
        &format!("[CQ:at,qq={target}] {text}"),
    )
}

pub fn group_message_segments(
    group_id: GroupId,
    user_id: UserId,
    segments: Value,
    raw: &str,
) -> Value {
    json!({
        "post_type": "message",
        "message_type": "group",
        "sub_type": "normal",
        "time": 1_700_000_000,
        "self_id": SELF_ID,
        "message_id": 2,
        "group_id": group_id,
        "user_id": user_id,
        "message": segments,
        "raw_message": raw,
        "font": 0,
        "sender": {"user_id": user_id, "nickname": format!("user{user_id}"), "role": "member"},
    })
}

pub fn group_increase(group_id: GroupId, user_id: UserId) -> Value {
    json!({
        "post_type": "notice",
        "notice_type": "group_increase",
        "sub_type": "approve",
        "time": 1_700_000_000,
        "self_id": SELF_ID,
        "group_id": group_id,
        "user_id": user_id,
        "operator_id": user_id,
    })
}

pub fn offline_file(user_id: UserId, name: &str, url: &str) -> Value {
    json!({
        "post_type": "notice",
        "notice_type": "offline_file",
        "time": 1_700_000_000,
        "self_id": SELF_ID,
        "user_id": user_id,
        "file": {"name": name, "size": 3, "url": url},
    })
}

pub fn friend_request(user_id: UserId, flag: &str) -> Value {
    json!({
        "post_type": "request",
        "request_type": "friend",
        "time": 1_700_000_000,
        "self_id": SELF_ID,
        "user_id": user_id,
        "comment": "hi",
        "flag": flag,
    })
}

pub fn heartbeat() -> Value {
    json!({
        "post_type": "meta_event",
        "meta_event_type": "heartbeat",
        "time": 1_700_000_000,
        "self_id": SELF_ID,
        "interval": 5000,
        "status": {"online": true, "good": true},
    })
}

/// A successful reply to the request carrying `echo`.
pub fn reply_ok(echo: &Value, data: Value) -> Value {
    json!({"status": "ok", "retcode": 0, "data": data, "echo": echo})
}

/// A failed reply to the request carrying `echo`.
pub fn reply_failed(echo: &Value, retcode: i64, message: &str) -> Value {
    json!({
        "status": "failed",
        "retcode": retcode,
        "data": null,
        "message": message,
        "wording": message,
        "echo": echo,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mention_raw_carries_cq_code() {
        let frame = group_mention(5, 42, SELF_ID, "help");
        assert_eq!(frame["raw_message"], "[CQ:at,qq=10] help");
        assert_eq!(frame["message"][0]["data"]["qq"], "10");
    }

    #[test]
    fn replies_echo_the_token() {
        let echo = json!("abc-1");
        assert_eq!(reply_ok(&echo, json!({}))["echo"], "abc-1");
        assert_eq!(reply_failed(&echo, 100, "nope")["retcode"], 100);
    }
}
