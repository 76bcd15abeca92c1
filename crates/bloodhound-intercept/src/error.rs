//! Error types for fault interception.

use thiserror::Error;

/// Errors related to fault interception.
#[derive(Debug, Error)]
pub enum InterceptError {
    /// Another interceptor already owns the process-wide panic hook.
    #[error("A Bloodhound panic hook is already installed in this process")]
    HookAlreadyInstalled,

    /// The hook cannot be swapped from a panicking thread.
    #[error("Cannot change the panic hook while the current thread is panicking")]
    Panicking,
}

/// Result type for interception operations.
pub type InterceptResult<T> = std::result::Result<T, InterceptError>;
