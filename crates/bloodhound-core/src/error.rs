//! Core error types for Bloodhound.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Error talking to a primary context.
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    /// Invalid settings were provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The settings file could not be read.
    #[error("Failed to read configuration file '{}': {source}", path.display())]
    ConfigIo {
        /// Path of the settings file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The settings file is not valid TOML.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Relaunching the application failed.
    #[error("Relaunch failed: {0}")]
    Relaunch(#[source] std::io::Error),
}

/// Errors raised by primary contexts.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The context no longer accepts tasks.
    #[error("Primary context '{name}' is closed")]
    Closed {
        /// Context name.
        name: String,
    },

    /// Failed to spawn the context's thread.
    #[error("Failed to spawn thread: {0}")]
    ThreadSpawnFailed(String),
}

/// Result type alias for core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Result type alias for context operations.
pub type ContextResult<T> = std::result::Result<T, ContextError>;
