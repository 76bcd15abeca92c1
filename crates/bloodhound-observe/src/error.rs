//! Error types for reporting.

use thiserror::Error;

/// Errors building a stack trace analyzer.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The application prefix is empty.
    #[error("Application prefix must not be empty")]
    EmptyPrefix,

    /// The frame pattern could not be compiled.
    #[error("Invalid frame pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Errors forwarding a report to a telemetry sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink rejected or failed to deliver the report.
    #[error("Telemetry sink '{sink}' failed: {reason}")]
    Failed {
        /// Sink name.
        sink: String,
        /// Failure reason.
        reason: String,
    },

    /// IO error writing the report.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The report could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for analyzer construction.
pub type TraceResult<T> = std::result::Result<T, TraceError>;

/// Result type for sink operations.
pub type SinkResult<T> = std::result::Result<T, SinkError>;
