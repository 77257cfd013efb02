//! Payload codec: structured-vs-text decision for outgoing payloads.

use relayhook_types::message::{Content, Message};
use tracing::trace;

/// Chooses the wire representation of composed text and renders received
/// content for display.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadCodec;

impl PayloadCodec {
    /// Create a codec.
    pub fn new() -> Self {
        Self
    }

    /// Encode composed text.
    ///
    /// Newlines are removed and the remainder is parsed as JSON. On success
    /// the parsed value replaces the original text. On failure the original
    /// text is returned untouched, newlines included.
    pub fn encode(&self, raw: &str) -> Content {
        let flattened: String = raw.chars().filter(|c| *c != '\n').collect();
        match serde_json::from_str::<serde_json::Value>(&flattened) {
            Ok(value) => Content::Structured(value),
            Err(e) => {
                trace!(error = %e, "Payload is not structured, sending as text");
                Content::Text(raw.to_string())
            }
        }
    }

    /// Render a message's content for display. Never fails.
    pub fn decode(&self, msg: &Message) -> String {
        self.render(&msg.content)
    }

    /// Render content: text verbatim, structured values in compact JSON form
    /// with keys in authored order.
    pub fn render(&self, content: &Content) -> String {
        match content {
            Content::Text(text) => text.clone(),
            Content::Structured(value) => value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_becomes_structured() {
        let codec = PayloadCodec::new();
        let content = codec.encode(r#"{"texts":["A","B","C"]}"#);
        assert_eq!(content, Content::Structured(json!({"texts": ["A", "B", "C"]})));
    }

    #[test]
    fn test_scalars_are_structured() {
        let codec = PayloadCodec::new();
        assert_eq!(codec.encode("42"), Content::Structured(json!(42)));
        assert_eq!(codec.encode("true"), Content::Structured(json!(true)));
        assert_eq!(codec.encode("null"), Content::Structured(json!(null)));
        assert_eq!(codec.encode(r#""quoted""#), Content::Structured(json!("quoted")));
    }

    #[test]
    fn test_invalid_json_is_text_unchanged() {
        let codec = PayloadCodec::new();
        let raw = r#"{not: "json"}"#;
        assert_eq!(codec.encode(raw), Content::Text(raw.to_string()));
    }

    #[test]
    fn test_text_keeps_embedded_newlines() {
        let codec = PayloadCodec::new();
        assert_eq!(
            codec.encode("Hello\nHow are you?"),
            Content::Text("Hello\nHow are you?".to_string())
        );
    }

    #[test]
    fn test_multiline_json_is_flattened() {
        let codec = PayloadCodec::new();
        let content = codec.encode("{\"a\":\n[1,\n2]}");
        assert_eq!(content, Content::Structured(json!({"a": [1, 2]})));
    }

    #[test]
    fn test_empty_input_is_text() {
        let codec = PayloadCodec::new();
        assert_eq!(codec.encode(""), Content::Text(String::new()));
    }

    #[test]
    fn test_render_preserves_key_order() {
        let codec = PayloadCodec::new();
        let content = codec.encode(r#"{"zeta":1,"alpha":{"texts":["A","B","C"]}}"#);
        assert_eq!(
            codec.render(&content),
            r#"{"zeta":1,"alpha":{"texts":["A","B","C"]}}"#
        );
    }

    #[test]
    fn test_decode_renders_parseable_structure() {
        let codec = PayloadCodec::new();
        let raw = r#"{"texts": ["A", "B", "C"], "n": 3}"#;
        let msg = Message::new("", codec.encode(raw));
        let rendered = codec.decode(&msg);
        let reparsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(reparsed, serde_json::from_str::<serde_json::Value>(raw).unwrap());
    }

    #[test]
    fn test_structured_shapes_survive_encode_decode() {
        let codec = PayloadCodec::new();
        let cases = [
            "null",
            "true",
            "-12.5e3",
            "0",
            r#""quoted string""#,
            r#""caf\u00e9 \"esc\"""#,
            "[]",
            "{}",
            r#"[1,"two",null,false,[3.5]]"#,
            r#"{"nested":{"deep":{"list":[{"k":"v"}]}},"unicode":"漢字"}"#,
            "  { \"spaced\" : [ 1 , 2 ] }  ",
            "{\"split\":\n[1,\n2]}",
        ];
        for raw in cases {
            let expected: serde_json::Value = serde_json::from_str(&raw.replace('\n', "")).unwrap();
            let content = codec.encode(raw);
            assert_eq!(content, Content::Structured(expected.clone()), "encode {raw:?}");

            let rendered = codec.decode(&Message::new("", content));
            let reparsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
            assert_eq!(reparsed, expected, "decode {raw:?}");
        }
    }

    #[test]
    fn test_invalid_shapes_stay_text() {
        let codec = PayloadCodec::new();
        let cases = [
            r#"{not: "json"}"#,
            "{\"a\":1,}",
            "[1, 2",
            "'single'",
            "hello\nworld",
            "NaN",
            "{} trailing",
        ];
        for raw in cases {
            assert_eq!(codec.encode(raw), Content::Text(raw.to_string()), "encode {raw:?}");
        }
    }

    #[test]
    fn test_decode_text_verbatim() {
        let codec = PayloadCodec::new();
        let msg = Message::new("", Content::Text("line one\nline two".to_string()));
        assert_eq!(codec.decode(&msg), "line one\nline two");
    }
}
