//! Monitor settings.
//!
//! [`MonitorSettings`] holds the plain, serialisable part of a monitor's
//! configuration. It can be built in code with `with_*` setters or loaded
//! from a TOML file:
//!
//! ```toml
//! app_prefix = "my_app"
//! policy = "terminate"
//! threshold_ms = 5000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::recovery::RecoveryPolicy;

/// Title shown with a report when none is configured.
pub const DEFAULT_TITLE: &str = "App Crashed";

/// Message shown with a report when none is configured.
pub const DEFAULT_MESSAGE: &str = "Sorry, we are working to fix this error.";

/// Serialisable monitor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Prefix identifying the application's own frames in a fault trace,
    /// e.g. a crate name (`my_app`) or a package (`com.example.app`).
    pub app_prefix: String,

    /// Title to display alongside a report.
    pub title: String,

    /// Message to display alongside a report.
    pub message: String,

    /// Recovery applied after reporting.
    pub policy: RecoveryPolicy,

    /// Period between liveness probes, in milliseconds.
    ///
    /// Defaults to 200ms.
    pub probe_interval_ms: u64,

    /// Idle time after which the primary context counts as hung.
    ///
    /// Defaults to 3000ms.
    pub threshold_ms: u64,

    /// Stop probing after the first hang instead of continuing silently.
    pub stop_on_hang: bool,

    /// Exit code used when the process is ended by recovery.
    pub exit_code: i32,

    /// Install the process-wide panic hook while a session runs.
    pub capture_panics: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            app_prefix: String::new(),
            title: DEFAULT_TITLE.to_string(),
            message: DEFAULT_MESSAGE.to_string(),
            policy: RecoveryPolicy::default(),
            probe_interval_ms: 200,
            threshold_ms: 3000,
            stop_on_hang: true,
            exit_code: 1,
            capture_panics: true,
        }
    }
}

impl MonitorSettings {
    /// Create settings for the application identified by `app_prefix`.
    pub fn new(app_prefix: impl Into<String>) -> Self {
        Self {
            app_prefix: app_prefix.into(),
            ..Default::default()
        }
    }

    /// Set the report title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the report message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the recovery policy.
    pub fn with_policy(mut self, policy: RecoveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the probe interval.
    pub fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the hang threshold.
    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold_ms = threshold.as_millis() as u64;
        self
    }

    /// Configure whether probing stops after a hang.
    pub fn with_stop_on_hang(mut self, stop: bool) -> Self {
        self.stop_on_hang = stop;
        self
    }

    /// Set the exit code used by recovery.
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Enable or disable the panic hook.
    pub fn with_capture_panics(mut self, enabled: bool) -> Self {
        self.capture_panics = enabled;
        self
    }

    /// Probe interval as a duration.
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    /// Hang threshold as a duration.
    pub fn threshold(&self) -> Duration {
        Duration::from_millis(self.threshold_ms)
    }

    /// Check the settings for values the monitor cannot work with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.app_prefix.trim().is_empty() {
            return Err(CoreError::InvalidConfig(
                "app_prefix must not be empty".to_string(),
            ));
        }
        if self.probe_interval_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "probe_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.threshold_ms <= self.probe_interval_ms {
            return Err(CoreError::InvalidConfig(format!(
                "threshold_ms ({}) must be greater than probe_interval_ms ({})",
                self.threshold_ms, self.probe_interval_ms
            )));
        }
        Ok(())
    }

    /// Parse settings from TOML text and validate them.
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        let settings: MonitorSettings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file and validate them.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
