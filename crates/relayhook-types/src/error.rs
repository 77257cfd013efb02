//! Shared error types for relayhook.

use crate::message::Direction;
use thiserror::Error;

/// Top-level error type for relayhook.
#[derive(Error, Debug)]
pub enum RelayHookError {
    /// The same (route, direction) pair was registered twice.
    #[error("Route '{route}' is already registered for {direction} handlers")]
    DuplicateRoute {
        /// The route that was registered twice.
        route: String,
        /// Direction of the conflicting registration.
        direction: Direction,
    },

    /// Two outbound handlers could match the same send tick.
    #[error("Outbound route '{route}' overlaps outbound route '{existing}'")]
    OutboundConflict {
        /// The route being registered.
        route: String,
        /// The route already present in the registry.
        existing: String,
    },

    /// The connection is shutting down.
    #[error("Shutdown in progress")]
    ShuttingDown,
}

/// Alias for Result with RelayHookError.
pub type RelayHookResult<T> = Result<T, RelayHookError>;
