//! Client-side message dispatch runtime.
//!
//! Handlers are bound to routes in a [`RouteRegistry`] at startup. The
//! [`ConnectionLoop`] then interleaves inbound frames and outbound send ticks
//! on one cooperative loop, handing both to the [`HookDispatcher`].

pub mod builtin_hooks;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod error;
pub mod event_loop;
pub mod hooks;
pub mod input;
pub mod registry;

pub use builtin_hooks::{RequireField, SenderTag};
pub use console::{ChannelConsole, Console};
pub use dispatch::{DispatchReport, ErrorSink, HandlerFailure, HookDispatcher, TracingErrorSink};
pub use error::{RuntimeError, RuntimeResult};
pub use event_loop::{ConnectionLoop, Producer, RunSummary};
pub use hooks::{HookContext, HookOutcome, InboundHandler, OutboundHandler, PayloadHook, SendTrigger};
pub use input::{ComposeStep, ComposerState, InputComposer, InputMode};
pub use registry::{Handler, RouteRegistry};
