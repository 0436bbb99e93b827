// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns raw event frames into typed [`InboundEvent`]s.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tern_core::InboundEvent;
use tracing::{debug, warn};

/// Why a frame produced no dispatchable event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Heartbeat or lifecycle frame.
    Meta,
    /// A discriminator combination with no handler category.
    Unknown(String),
    /// A known combination whose payload failed to decode.
    Malformed(String),
}

/// Result of classifying one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Event(InboundEvent),
    Ignored(IgnoreReason),
}

fn discriminator<'a>(frame: &'a Value, field: &str) -> &'a str {
    frame.get(field).and_then(Value::as_str).unwrap_or("")
}

fn decode<T: DeserializeOwned>(
    frame: &Value,
    kind: &str,
    wrap: impl FnOnce(T) -> InboundEvent,
) -> Classified {
    match T::deserialize(frame) {
        Ok(payload) => Classified::Event(wrap(payload)),
        Err(e) => {
            warn!(kind, error = %e, "dropping event with malformed payload");
            Classified::Ignored(IgnoreReason::Malformed(format!("{kind}: {e}")))
        }
    }
}

/// Classify an event frame by its `post_type` and sub-discriminators.
pub fn classify(frame: &Value) -> Classified {
    let post_type = discriminator(frame, "post_type");
    match post_type {
        "meta_event" => Classified::Ignored(IgnoreReason::Meta),
        "message" => match discriminator(frame, "message_type") {
            "private" => decode(frame, "private message", InboundEvent::PrivateMessage),
            "group" if frame.get("group_id").is_some() => {
                decode(frame, "group message", InboundEvent::GroupMessage)
            }
            other => unknown(format!("message/{other}")),
        },
        "notice" => match discriminator(frame, "notice_type") {
            "group_increase" => decode(frame, "group increase", InboundEvent::GroupIncrease),
            "offline_file" => decode(frame, "offline file", InboundEvent::OfflineFile),
            other => unknown(format!("notice/{other}")),
        },
        "request" => match discriminator(frame, "request_type") {
            "friend" | "private" | "group" => {
                decode(frame, "add request", InboundEvent::AddRequest)
            }
            other => unknown(format!("request/{other}")),
        },
        other => unknown(other.to_string()),
    }
}

fn unknown(combination: String) -> Classified {
    debug!(combination = %combination, "ignoring unhandled event kind");
    Classified::Ignored(IgnoreReason::Unknown(combination))
}
