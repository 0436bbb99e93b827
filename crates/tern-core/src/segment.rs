// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message segments and outbound message bodies.
//!
//! A message on the wire is an array of `{"type": ..., "data": {...}}`
//! objects. Segments are kept loosely typed (a kind plus a JSON map) so that
//! gateway-specific extensions survive a round trip untouched; the builders
//! below cover the standard kinds.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};

/// One content segment of a chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

fn data_of(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl Segment {
    /// Build a segment from a kind and a JSON object literal.
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data: data_of(data),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new("text", json!({ "text": text.into() }))
    }

    pub fn face(id: i64) -> Self {
        Self::new("face", json!({ "id": id.to_string() }))
    }

    /// Image by file name, path or URL.
    pub fn image(file: impl Into<String>) -> Self {
        Self::new("image", json!({ "file": file.into() }))
    }

    pub fn record(file: impl Into<String>) -> Self {
        Self::new("record", json!({ "file": file.into() }))
    }

    pub fn video(file: impl Into<String>) -> Self {
        Self::new("video", json!({ "file": file.into() }))
    }

    /// Mention a user. `"all"` mentions everyone.
    pub fn at(qq: impl ToString) -> Self {
        Self::new("at", json!({ "qq": qq.to_string() }))
    }

    pub fn rps() -> Self {
        Self::new("rps", json!({}))
    }

    pub fn dice() -> Self {
        Self::new("dice", json!({}))
    }

    pub fn shake() -> Self {
        Self::new("shake", json!({}))
    }

    pub fn poke(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new("poke", json!({ "type": kind.into(), "id": id.into() }))
    }

    pub fn anonymous() -> Self {
        Self::new("anonymous", json!({}))
    }

    pub fn share(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new("share", json!({ "url": url.into(), "title": title.into() }))
    }

    /// Recommend a friend (`"qq"`) or a group (`"group"`).
    pub fn contact(kind: impl Into<String>, id: i64) -> Self {
        Self::new("contact", json!({ "type": kind.into(), "id": id.to_string() }))
    }

    pub fn location(lat: f64, lon: f64) -> Self {
        Self::new("location", json!({ "lat": lat.to_string(), "lon": lon.to_string() }))
    }

    /// Music share from a known platform (`qq`, `163`, `xm`).
    pub fn music(platform: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new("music", json!({ "type": platform.into(), "id": id.into() }))
    }

    pub fn reply(message_id: i64) -> Self {
        Self::new("reply", json!({ "id": message_id.to_string() }))
    }

    /// Forward node referencing an existing message.
    pub fn node(message_id: i64) -> Self {
        Self::new("node", json!({ "id": message_id.to_string() }))
    }

    pub fn xml(data: impl Into<String>) -> Self {
        Self::new("xml", json!({ "data": data.into() }))
    }

    pub fn json(data: impl Into<String>) -> Self {
        Self::new("json", json!({ "data": data.into() }))
    }

    /// The text payload of a `text` segment.
    pub fn as_text(&self) -> Option<&str> {
        if self.kind != "text" {
            return None;
        }
        self.data.get("text").and_then(Value::as_str)
    }

    /// The mentioned account of an `at` segment, normalised to a string.
    ///
    /// Gateways disagree on whether `qq` is a number or a string.
    pub fn at_target(&self) -> Option<String> {
        if self.kind != "at" {
            return None;
        }
        match self.data.get("qq")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Download URL of an `image` segment, if the gateway supplied one.
    pub fn image_url(&self) -> Option<&str> {
        if self.kind != "image" {
            return None;
        }
        self.data.get("url").and_then(Value::as_str)
    }

    /// The `file` field, shared by image, record, video and file segments.
    pub fn file_name(&self) -> Option<&str> {
        self.data.get("file").and_then(Value::as_str)
    }
}

/// Accept either a segment array or a plain (CQ-coded) string for `message`.
pub fn deserialize_segments<'de, D>(deserializer: D) -> Result<Vec<Segment>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Segments(Vec<Segment>),
        Text(String),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::Segments(segments) => segments,
        Repr::Text(text) if text.is_empty() => Vec::new(),
        Repr::Text(text) => vec![Segment::text(text)],
    })
}

/// Outbound message content: plain text or a list of segments.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageBody {
    Text(String),
    Segments(Vec<Segment>),
}

impl From<&str> for MessageBody {
    fn from(value: &str) -> Self {
        MessageBody::Text(value.to_string())
    }
}

impl From<String> for MessageBody {
    fn from(value: String) -> Self {
        MessageBody::Text(value)
    }
}

impl From<Segment> for MessageBody {
    fn from(value: Segment) -> Self {
        MessageBody::Segments(vec![value])
    }
}

impl From<Vec<Segment>> for MessageBody {
    fn from(value: Vec<Segment>) -> Self {
        MessageBody::Segments(value)
    }
}
