//! Error types for hang detection.

use thiserror::Error;

/// Errors related to hang detection.
#[derive(Debug, Error)]
pub enum DetectError {
    /// Failed to spawn the detector thread.
    #[error("Failed to spawn thread: {0}")]
    ThreadSpawnFailed(String),

    /// Configuration error.
    #[error("Invalid detector configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for detector operations.
pub type DetectResult<T> = std::result::Result<T, DetectError>;
