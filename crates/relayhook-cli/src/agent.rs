//! The console input agent: prints what the relay delivers and forwards
//! composed console input.

use async_trait::async_trait;
use relayhook_runtime::builtin_hooks::SenderTag;
use relayhook_runtime::input::PRIMARY_PROMPT;
use relayhook_runtime::{HookContext, HookOutcome, InboundHandler, OutboundHandler, RouteRegistry, SendTrigger};
use relayhook_types::config::ClientConfig;
use relayhook_types::error::RelayHookResult;
use relayhook_types::message::{Content, Direction, Message};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Prefix marking relay-originated warnings.
const SERVER_WARNING_PREFIX: &str = "Warning:";

/// Display tag for a received message.
pub fn received_tag(content: &Content) -> &'static str {
    match content.as_text() {
        Some(text) if text.starts_with(SERVER_WARNING_PREFIX) => "[From server]",
        _ => "[Received]",
    }
}

/// Prints every inbound message over the current prompt, then re-shows the
/// primary prompt.
pub struct ReceivedPrinter<W> {
    out: Mutex<W>,
}

impl<W> ReceivedPrinter<W> {
    /// Print received messages to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W> InboundHandler for ReceivedPrinter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn on_message(&self, ctx: &HookContext<'_>, msg: &Message) -> anyhow::Result<HookOutcome> {
        let line = format!(
            "\r{} {}\n{PRIMARY_PROMPT}",
            received_tag(&msg.content),
            ctx.codec.decode(msg)
        );
        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes()).await?;
        out.flush().await?;
        Ok(HookOutcome::Handled)
    }
}

/// Forwards composed console input unchanged.
pub struct ConsoleForwarder;

#[async_trait]
impl OutboundHandler for ConsoleForwarder {
    async fn produce(
        &self,
        _ctx: &HookContext<'_>,
        trigger: &SendTrigger,
    ) -> anyhow::Result<Option<Content>> {
        Ok(trigger.input.clone())
    }
}

/// Route table for the console agent.
pub fn build_registry(config: &ClientConfig) -> RelayHookResult<RouteRegistry> {
    let mut registry = RouteRegistry::new();
    registry.register_inbound("", Arc::new(ReceivedPrinter::new(tokio::io::stdout())))?;
    registry.register_outbound("", Arc::new(ConsoleForwarder))?;
    if config.tag_sender {
        registry.register_hook(Direction::Outbound, Arc::new(SenderTag::new(config.sender.clone())));
    }
    Ok(registry)
}
