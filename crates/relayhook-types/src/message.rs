//! Message types exchanged through the relay.
//!
//! A [`Message`] is the runtime view of one relay frame: its [`Content`] is
//! either opaque text or a parsed structured value, never both. The
//! [`Envelope`] is the JSON object actually written to and read from the wire.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Envelope version written on every outgoing frame.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Type tag for text content.
pub const TYPE_TEXT: &str = "str";

/// Type tag for structured content.
pub const TYPE_STRUCTURED: &str = "json";

/// Direction of traffic a handler is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Frames arriving from the relay.
    Inbound,
    /// Messages produced locally and sent to the relay.
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inbound => write!(f, "inbound"),
            Self::Outbound => write!(f, "outbound"),
        }
    }
}

/// Message payload: opaque text or a structured value.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Opaque text, embedded newlines preserved.
    Text(String),
    /// A parsed JSON value.
    Structured(serde_json::Value),
}

impl Content {
    /// The `_type` tag written for this content.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Text(_) => TYPE_TEXT,
            Self::Structured(_) => TYPE_STRUCTURED,
        }
    }

    /// Returns the text if this is a `Text` payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Structured(_) => None,
        }
    }

    /// Returns the value if this is a `Structured` payload.
    pub fn as_structured(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Text(_) => None,
            Self::Structured(value) => Some(value),
        }
    }

    /// Convert into the JSON value stored in an envelope's `content` field.
    pub fn to_wire_value(&self) -> serde_json::Value {
        match self {
            Self::Text(text) => serde_json::Value::String(text.clone()),
            Self::Structured(value) => value.clone(),
        }
    }

    /// Rebuild content from an envelope's `content` field.
    ///
    /// A JSON string is text unless the sender tagged it `json`; every other
    /// JSON value is structured.
    pub fn from_wire_value(value: serde_json::Value, type_tag: Option<&str>) -> Self {
        match value {
            serde_json::Value::String(text) if type_tag != Some(TYPE_STRUCTURED) => {
                Self::Text(text)
            }
            other => Self::Structured(other),
        }
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<serde_json::Value> for Content {
    fn from(value: serde_json::Value) -> Self {
        Self::Structured(value)
    }
}

/// One logical message flowing through the dispatch runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// The payload.
    pub content: Content,
    /// `_type` tag from the envelope.
    pub type_tag: String,
    /// `_version` from the envelope.
    pub version: String,
    /// `host:port` of the original sender, supplied by the relay on inbound frames.
    pub remote_addr: Option<String>,
    /// Route key used to match handlers. Empty when the frame carries none.
    pub route: String,
}

impl Message {
    /// Build a locally produced message for the given route.
    pub fn new(route: impl Into<String>, content: Content) -> Self {
        Self {
            type_tag: content.type_tag().to_string(),
            content,
            version: PROTOCOL_VERSION.to_string(),
            remote_addr: None,
            route: route.into(),
        }
    }
}

/// The JSON object carried by one relay frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// The payload; absent on malformed frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
    /// Content type tag (`str` or `json`).
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    /// Envelope version.
    #[serde(rename = "_version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Route key the sender produced this message for.
    #[serde(rename = "_route", default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Sender address, added by the relay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_addr: Option<String>,
}

impl Envelope {
    /// Envelope for an outgoing message. `remote_addr` is never set by senders.
    pub fn from_message(msg: &Message) -> Self {
        Self {
            content: Some(msg.content.to_wire_value()),
            type_tag: Some(msg.content.type_tag().to_string()),
            version: Some(msg.version.clone()),
            route: if msg.route.is_empty() {
                None
            } else {
                Some(msg.route.clone())
            },
            remote_addr: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Inbound.to_string(), "inbound");
        assert_eq!(Direction::Outbound.to_string(), "outbound");
    }

    #[test]
    fn test_content_type_tags() {
        assert_eq!(Content::from("hi").type_tag(), "str");
        assert_eq!(Content::from(json!({"a": 1})).type_tag(), "json");
    }

    #[test]
    fn test_from_wire_value_keeps_tagged_json_string() {
        let content = Content::from_wire_value(json!("quoted"), Some("json"));
        assert_eq!(content, Content::Structured(json!("quoted")));

        let content = Content::from_wire_value(json!("plain"), Some("str"));
        assert_eq!(content, Content::Text("plain".to_string()));

        let content = Content::from_wire_value(json!("untagged"), None);
        assert_eq!(content, Content::Text("untagged".to_string()));
    }

    #[test]
    fn test_envelope_field_names() {
        let msg = Message::new("greet", Content::from(json!({"texts": ["A", "B"]})));
        let json = serde_json::to_string(&Envelope::from_message(&msg)).unwrap();
        assert_eq!(
            json,
            r#"{"content":{"texts":["A","B"]},"_type":"json","_version":"1.0","_route":"greet"}"#
        );
    }

    #[test]
    fn test_envelope_omits_empty_route() {
        let msg = Message::new("", Content::from("hello"));
        let env = Envelope::from_message(&msg);
        assert!(env.route.is_none());
        assert!(env.remote_addr.is_none());
    }

    #[test]
    fn test_envelope_tolerates_missing_fields() {
        let env: Envelope = serde_json::from_str(r#"{"remote_addr":"10.0.0.2:5000"}"#).unwrap();
        assert!(env.content.is_none());
        assert_eq!(env.remote_addr.as_deref(), Some("10.0.0.2:5000"));
    }
}
