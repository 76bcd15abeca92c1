//! Error types for the monitor facade.

use thiserror::Error;

/// Errors from configuring or running a monitor session.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] bloodhound_core::CoreError),

    /// Trace analyzer error.
    #[error("Trace error: {0}")]
    Trace(#[from] bloodhound_observe::TraceError),

    /// Hang detector error.
    #[error("Detector error: {0}")]
    Detect(#[from] bloodhound_detect::DetectError),

    /// Interception error.
    #[error("Interception error: {0}")]
    Intercept(#[from] bloodhound_intercept::InterceptError),
}

/// Result type for monitor operations.
pub type MonitorResult<T> = std::result::Result<T, MonitorError>;
