//! Route registry: route to handler bindings for both directions.
//!
//! Registration happens once at startup through `&mut self`; the registry is
//! then shared behind an `Arc` and only read. Handlers are matched in
//! registration order.

use crate::hooks::{InboundHandler, OutboundHandler, PayloadHook};
use relayhook_types::error::{RelayHookError, RelayHookResult};
use relayhook_types::message::Direction;
use std::sync::Arc;
use tracing::debug;

/// A handler of either direction.
#[derive(Clone)]
pub enum Handler {
    Inbound(Arc<dyn InboundHandler>),
    Outbound(Arc<dyn OutboundHandler>),
}

impl Handler {
    /// Direction this handler serves.
    pub fn direction(&self) -> Direction {
        match self {
            Self::Inbound(_) => Direction::Inbound,
            Self::Outbound(_) => Direction::Outbound,
        }
    }
}

/// A route bound to a handler.
pub struct Binding<H: ?Sized> {
    route: String,
    handler: Arc<H>,
}

impl<H: ?Sized> Binding<H> {
    /// The bound route.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// The bound handler.
    pub fn handler(&self) -> &Arc<H> {
        &self.handler
    }
}

/// Whether a registered route matches an event key. The empty route matches
/// every key.
pub fn route_matches(route: &str, key: &str) -> bool {
    route.is_empty() || route == key
}

fn same_handler<H: ?Sized>(a: &Arc<H>, b: &Arc<H>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Route table for inbound and outbound handlers plus payload hooks.
#[derive(Default)]
pub struct RouteRegistry {
    inbound: Vec<Binding<dyn InboundHandler>>,
    outbound: Vec<Binding<dyn OutboundHandler>>,
    receive_hooks: Vec<Arc<dyn PayloadHook>>,
    send_hooks: Vec<Arc<dyn PayloadHook>>,
}

impl RouteRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler to a route.
    ///
    /// Inbound routes may carry several handlers, all of which run; binding
    /// the same handler instance to the same route twice fails. Outbound
    /// routes carry exactly one handler: a repeated route fails, and so does
    /// any overlap with an existing outbound route through the wildcard.
    pub fn register(&mut self, route: impl Into<String>, handler: Handler) -> RelayHookResult<()> {
        let route = route.into();
        let direction = handler.direction();
        match handler {
            Handler::Inbound(handler) => {
                if self
                    .inbound
                    .iter()
                    .any(|b| b.route == route && same_handler(&b.handler, &handler))
                {
                    return Err(RelayHookError::DuplicateRoute { route, direction });
                }
                debug!(route = %route, %direction, "Registered handler");
                self.inbound.push(Binding { route, handler });
            }
            Handler::Outbound(handler) => {
                for existing in &self.outbound {
                    if existing.route == route {
                        return Err(RelayHookError::DuplicateRoute { route, direction });
                    }
                    if existing.route.is_empty() || route.is_empty() {
                        return Err(RelayHookError::OutboundConflict {
                            route,
                            existing: existing.route.clone(),
                        });
                    }
                }
                debug!(route = %route, %direction, "Registered handler");
                self.outbound.push(Binding { route, handler });
            }
        }
        Ok(())
    }

    /// Bind an inbound handler.
    pub fn register_inbound(
        &mut self,
        route: impl Into<String>,
        handler: Arc<dyn InboundHandler>,
    ) -> RelayHookResult<()> {
        self.register(route, Handler::Inbound(handler))
    }

    /// Bind an outbound handler.
    pub fn register_outbound(
        &mut self,
        route: impl Into<String>,
        handler: Arc<dyn OutboundHandler>,
    ) -> RelayHookResult<()> {
        self.register(route, Handler::Outbound(handler))
    }

    /// Add a payload hook. Hooks of one direction run in registration order.
    pub fn register_hook(&mut self, direction: Direction, hook: Arc<dyn PayloadHook>) {
        debug!(hook = hook.name(), %direction, "Registered payload hook");
        match direction {
            Direction::Inbound => self.receive_hooks.push(hook),
            Direction::Outbound => self.send_hooks.push(hook),
        }
    }

    /// Inbound bindings matching `key`, in registration order.
    pub fn match_inbound(&self, key: &str) -> Vec<&Binding<dyn InboundHandler>> {
        self.inbound
            .iter()
            .filter(|b| route_matches(&b.route, key))
            .collect()
    }

    /// Outbound bindings matching `key`, in registration order.
    pub fn match_outbound(&self, key: &str) -> Vec<&Binding<dyn OutboundHandler>> {
        self.outbound
            .iter()
            .filter(|b| route_matches(&b.route, key))
            .collect()
    }

    /// Routes of all outbound handlers, in registration order. Each is ticked
    /// once per send tick.
    pub fn outbound_routes(&self) -> Vec<&str> {
        self.outbound.iter().map(|b| b.route.as_str()).collect()
    }

    /// Payload hooks for a direction.
    pub fn hooks(&self, direction: Direction) -> &[Arc<dyn PayloadHook>] {
        match direction {
            Direction::Inbound => &self.receive_hooks,
            Direction::Outbound => &self.send_hooks,
        }
    }

    /// Check if any handler is bound for a direction.
    pub fn has_handlers(&self, direction: Direction) -> bool {
        match direction {
            Direction::Inbound => !self.inbound.is_empty(),
            Direction::Outbound => !self.outbound.is_empty(),
        }
    }
}
