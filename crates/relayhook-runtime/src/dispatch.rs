//! Hook dispatcher: runs matching handlers for inbound messages and send ticks.
//!
//! Inbound: receive hooks run first, then every matching handler in
//! registration order. A failing or panicking handler is reported to the
//! [`ErrorSink`] and the next handler still runs.
//!
//! Outbound: the first matching handler that yields a body supplies the
//! message, which then passes through the send hooks.

use crate::hooks::{HookContext, HookOutcome, SendTrigger};
use crate::registry::RouteRegistry;
use futures::FutureExt;
use relayhook_types::message::{Direction, Message};
use relayhook_wire::PayloadCodec;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

/// A handler or hook failure isolated by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerFailure {
    /// Direction being dispatched.
    pub direction: Direction,
    /// Route key of the event.
    pub route: String,
    /// What failed: `handler '<route>'` or `hook '<name>'`.
    pub source: String,
    /// Error text or panic message.
    pub error: String,
    /// Whether the callback panicked rather than returning an error.
    pub panicked: bool,
}

/// Receives isolated handler failures.
pub trait ErrorSink: Send + Sync {
    /// Report one failure. Must not panic.
    fn report(&self, failure: &HandlerFailure);
}

/// Default sink: logs failures through `tracing`.
#[derive(Debug, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, failure: &HandlerFailure) {
        warn!(
            direction = %failure.direction,
            route = %failure.route,
            source = %failure.source,
            panicked = failure.panicked,
            error = %failure.error,
            "Handler failed, continuing dispatch"
        );
    }
}

/// What happened to one inbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers whose route matched.
    pub matched: usize,
    /// Handlers that acted.
    pub handled: usize,
    /// Handlers that declined.
    pub declined: usize,
    /// Handlers or hooks that failed.
    pub failed: usize,
    /// Name of the receive hook that dropped the message, if any.
    pub dropped_by: Option<String>,
}

/// Matches events against the registry and invokes handlers.
pub struct HookDispatcher {
    agent_name: String,
    registry: Arc<RouteRegistry>,
    sink: Arc<dyn ErrorSink>,
    codec: PayloadCodec,
}

impl HookDispatcher {
    /// Create a dispatcher reporting failures through `tracing`.
    pub fn new(agent_name: impl Into<String>, registry: Arc<RouteRegistry>) -> Self {
        Self::with_sink(agent_name, registry, Arc::new(TracingErrorSink))
    }

    /// Create a dispatcher with a custom error sink.
    pub fn with_sink(
        agent_name: impl Into<String>,
        registry: Arc<RouteRegistry>,
        sink: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            registry,
            sink,
            codec: PayloadCodec::new(),
        }
    }

    /// The route registry.
    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    /// The payload codec shared with handlers.
    pub fn codec(&self) -> &PayloadCodec {
        &self.codec
    }

    fn context<'a>(&'a self, direction: Direction, route: &'a str) -> HookContext<'a> {
        HookContext {
            agent_name: &self.agent_name,
            direction,
            route,
            codec: &self.codec,
        }
    }

    fn fail(&self, direction: Direction, route: &str, source: String, error: String, panicked: bool) {
        self.sink.report(&HandlerFailure {
            direction,
            route: route.to_string(),
            source,
            error,
            panicked,
        });
    }

    /// Dispatch one inbound message to every matching handler.
    pub async fn dispatch_inbound(&self, msg: Message) -> DispatchReport {
        let mut report = DispatchReport::default();
        let route = msg.route.clone();

        let Some(msg) = self
            .apply_hooks(Direction::Inbound, &route, msg, &mut report)
            .await
        else {
            return report;
        };

        let ctx = self.context(Direction::Inbound, &route);
        for binding in self.registry.match_inbound(&route) {
            report.matched += 1;
            let outcome = guarded(binding.handler().on_message(&ctx, &msg)).await;
            match outcome {
                Ok(HookOutcome::Handled) => report.handled += 1,
                Ok(HookOutcome::Declined) => {
                    debug!(route = %route, handler = binding.route(), "Handler declined message");
                    report.declined += 1;
                }
                Err((error, panicked)) => {
                    report.failed += 1;
                    self.fail(
                        Direction::Inbound,
                        &route,
                        format!("handler '{}'", binding.route()),
                        error,
                        panicked,
                    );
                }
            }
        }

        if report.matched == 0 {
            debug!(route = %route, "No inbound handler matched");
        }
        report
    }

    /// Run one send tick. Returns the message to transmit, if any handler
    /// produced one and no send hook dropped it.
    pub async fn dispatch_outbound(&self, trigger: &SendTrigger) -> Option<Message> {
        let ctx = self.context(Direction::Outbound, &trigger.route);
        let mut produced = None;
        for binding in self.registry.match_outbound(&trigger.route) {
            match guarded(binding.handler().produce(&ctx, trigger)).await {
                Ok(Some(content)) => {
                    produced = Some(content);
                    break;
                }
                Ok(None) => {}
                Err((error, panicked)) => self.fail(
                    Direction::Outbound,
                    &trigger.route,
                    format!("handler '{}'", binding.route()),
                    error,
                    panicked,
                ),
            }
        }

        let msg = Message::new(trigger.route.clone(), produced?);
        let mut report = DispatchReport::default();
        self.apply_hooks(Direction::Outbound, &trigger.route, msg, &mut report)
            .await
    }

    /// Run the payload hooks of one direction. A hook that drops or fails
    /// ends processing of the message.
    async fn apply_hooks(
        &self,
        direction: Direction,
        route: &str,
        mut msg: Message,
        report: &mut DispatchReport,
    ) -> Option<Message> {
        let ctx = self.context(direction, route);
        for hook in self.registry.hooks(direction) {
            match guarded(hook.apply(&ctx, msg)).await {
                Ok(Some(next)) => msg = next,
                Ok(None) => {
                    debug!(hook = hook.name(), %direction, route = %route, "Payload hook dropped message");
                    report.dropped_by = Some(hook.name().to_string());
                    return None;
                }
                Err((error, panicked)) => {
                    report.failed += 1;
                    self.fail(
                        direction,
                        route,
                        format!("hook '{}'", hook.name()),
                        error,
                        panicked,
                    );
                    report.dropped_by = Some(hook.name().to_string());
                    return None;
                }
            }
        }
        Some(msg)
    }
}

/// Await a callback, turning both errors and panics into `(message, panicked)`.
async fn guarded<T, F>(fut: F) -> Result<T, (String, bool)>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err((format!("{e:#}"), false)),
        Err(payload) => Err((panic_message(payload.as_ref()), true)),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
