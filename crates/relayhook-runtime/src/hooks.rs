//! Handler traits: the callbacks bound to routes.
//!
//! Three kinds of callback exist:
//! - `InboundHandler`: receives each inbound message whose route key matches.
//! - `OutboundHandler`: produces the message body for a send tick.
//! - `PayloadHook`: rewrites or drops a message before inbound dispatch or
//!   before transmission. Hooks are not route-bound.

use async_trait::async_trait;
use relayhook_types::message::{Content, Direction, Message};
use relayhook_wire::PayloadCodec;

/// Context passed to every handler and hook invocation.
pub struct HookContext<'a> {
    /// Name of the local agent.
    pub agent_name: &'a str,
    /// Direction of the event being dispatched.
    pub direction: Direction,
    /// Route key of the event.
    pub route: &'a str,
    /// Codec, for handlers that render or encode payloads.
    pub codec: &'a PayloadCodec,
}

/// Result of an inbound handler that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    /// The handler acted on the message.
    Handled,
    /// The handler chose not to act. Not an error.
    Declined,
}

/// One send tick for an outbound route.
#[derive(Debug, Clone, PartialEq)]
pub struct SendTrigger {
    /// Route key being ticked.
    pub route: String,
    /// Encoded console input, when the tick came from the console.
    pub input: Option<Content>,
}

impl SendTrigger {
    /// A tick without console input.
    pub fn tick(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            input: None,
        }
    }

    /// A tick carrying encoded console input.
    pub fn with_input(route: impl Into<String>, input: Content) -> Self {
        Self {
            route: route.into(),
            input: Some(input),
        }
    }
}

/// Handles inbound messages. Errors are isolated by the dispatcher.
#[async_trait]
pub trait InboundHandler: Send + Sync {
    /// Called for each matching inbound message.
    async fn on_message(&self, ctx: &HookContext<'_>, msg: &Message) -> anyhow::Result<HookOutcome>;
}

/// Produces outbound message bodies.
#[async_trait]
pub trait OutboundHandler: Send + Sync {
    /// Called once per send tick. `Ok(None)` sends nothing this tick.
    async fn produce(
        &self,
        ctx: &HookContext<'_>,
        trigger: &SendTrigger,
    ) -> anyhow::Result<Option<Content>>;
}

/// Rewrites or drops messages on their way in or out.
#[async_trait]
pub trait PayloadHook: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str;

    /// `Ok(None)` drops the message.
    async fn apply(&self, ctx: &HookContext<'_>, msg: Message) -> anyhow::Result<Option<Message>>;
}
