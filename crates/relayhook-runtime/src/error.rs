//! Runtime error types.

use relayhook_types::error::RelayHookError;
use relayhook_wire::WireError;
use thiserror::Error;

/// Runtime error type wrapping configuration and wire failures.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A wrapped RelayHookError.
    #[error(transparent)]
    RelayHook(#[from] RelayHookError),

    /// The relay connection failed.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// The console could not be read or written.
    #[error("Console error: {0}")]
    Console(std::io::Error),
}

/// Alias for runtime results.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
