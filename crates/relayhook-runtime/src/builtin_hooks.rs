//! Built-in payload hooks.

use crate::hooks::{HookContext, PayloadHook};
use async_trait::async_trait;
use relayhook_types::message::{Content, Message};
use serde_json::{Map, Value};

/// Send hook that normalises the payload to an object and stamps a `from`
/// field with the sender id.
///
/// Text becomes `{"message": text}`. Structured payloads that are not
/// objects are dropped.
pub struct SenderTag {
    sender: String,
}

impl SenderTag {
    /// Tag outgoing payloads with `sender` as their `from` field.
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }
}

#[async_trait]
impl PayloadHook for SenderTag {
    fn name(&self) -> &str {
        "sender_tag"
    }

    async fn apply(&self, _ctx: &HookContext<'_>, mut msg: Message) -> anyhow::Result<Option<Message>> {
        let mut object = match msg.content {
            Content::Text(text) => {
                let mut object = Map::new();
                object.insert("message".to_string(), Value::String(text));
                object
            }
            Content::Structured(Value::Object(object)) => object,
            Content::Structured(_) => return Ok(None),
        };
        object.insert("from".to_string(), Value::String(self.sender.clone()));

        msg.content = Content::Structured(Value::Object(object));
        msg.type_tag = msg.content.type_tag().to_string();
        Ok(Some(msg))
    }
}

/// Receive hook that drops messages whose structured content does not carry
/// `field == expected`.
pub struct RequireField {
    field: String,
    expected: Value,
}

impl RequireField {
    /// Keep only messages whose structured content has `field == expected`.
    pub fn new(field: impl Into<String>, expected: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
        }
    }
}

#[async_trait]
impl PayloadHook for RequireField {
    fn name(&self) -> &str {
        "require_field"
    }

    async fn apply(&self, _ctx: &HookContext<'_>, msg: Message) -> anyhow::Result<Option<Message>> {
        let matches = msg
            .content
            .as_structured()
            .and_then(|v| v.get(&self.field))
            .is_some_and(|v| *v == self.expected);
        Ok(matches.then_some(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayhook_types::message::Direction;
    use relayhook_wire::PayloadCodec;
    use serde_json::json;

    fn ctx(codec: &PayloadCodec) -> HookContext<'_> {
        HookContext {
            agent_name: "test",
            direction: Direction::Outbound,
            route: "",
            codec,
        }
    }

    #[tokio::test]
    async fn test_sender_tag_wraps_text() {
        let codec = PayloadCodec::new();
        let hook = SenderTag::new("user");
        let msg = Message::new("", Content::Text("hi".to_string()));
        let out = hook.apply(&ctx(&codec), msg).await.unwrap().unwrap();
        assert_eq!(out.content, Content::Structured(json!({"message": "hi", "from": "user"})));
        assert_eq!(out.type_tag, "json");
    }

    #[tokio::test]
    async fn test_sender_tag_overwrites_existing_sender() {
        let codec = PayloadCodec::new();
        let hook = SenderTag::new("agent-7");
        let msg = Message::new("", Content::Structured(json!({"texts": ["A"], "from": "someone"})));
        let out = hook.apply(&ctx(&codec), msg).await.unwrap().unwrap();
        assert_eq!(
            out.content,
            Content::Structured(json!({"texts": ["A"], "from": "agent-7"}))
        );
    }

    #[tokio::test]
    async fn test_sender_tag_drops_non_object() {
        let codec = PayloadCodec::new();
        let hook = SenderTag::new("user");
        let msg = Message::new("", Content::Structured(json!([1, 2, 3])));
        assert!(hook.apply(&ctx(&codec), msg).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_require_field() {
        let codec = PayloadCodec::new();
        let hook = RequireField::new("from", "user");

        let ok = Message::new("", Content::Structured(json!({"from": "user", "message": "x"})));
        assert!(hook.apply(&ctx(&codec), ok).await.unwrap().is_some());

        let other = Message::new("", Content::Structured(json!({"from": "bot"})));
        assert!(hook.apply(&ctx(&codec), other).await.unwrap().is_none());

        let text = Message::new("", Content::Text("from user".to_string()));
        assert!(hook.apply(&ctx(&codec), text).await.unwrap().is_none());
    }
}
