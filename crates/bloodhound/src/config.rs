//! Session configuration.

use std::sync::Arc;
use std::time::Duration;

use bloodhound_core::{
    DEFAULT_MESSAGE, DEFAULT_TITLE, IntoSharedContext, MonitorSettings, ProcessHost,
    RecoveryPolicy, SharedContext, SystemHost,
};
use bloodhound_detect::HangConfig;
use bloodhound_observe::{EventObserver, TelemetrySink};

use crate::error::{MonitorError, MonitorResult};

/// Everything a [`MonitorSession`](crate::MonitorSession) needs.
///
/// Built once with `with_*` setters and validated when the session is
/// created; the session never changes it afterwards.
#[derive(Clone)]
pub struct MonitorConfig {
    pub(crate) primary: SharedContext,
    pub(crate) primary_name: Option<String>,
    pub(crate) application: Option<String>,
    pub(crate) app_prefix: String,
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) policy: RecoveryPolicy,
    pub(crate) observer: Option<Arc<dyn EventObserver>>,
    pub(crate) sink: Option<Arc<dyn TelemetrySink>>,
    pub(crate) hang: HangConfig,
    pub(crate) exit_code: i32,
    pub(crate) capture_panics: bool,
    pub(crate) host: Arc<dyn ProcessHost>,
}

impl MonitorConfig {
    /// Create a configuration watching `primary`, keeping frames under
    /// `app_prefix` in reports.
    pub fn new(primary: impl IntoSharedContext, app_prefix: impl Into<String>) -> Self {
        Self {
            primary: primary.into_shared(),
            primary_name: None,
            application: None,
            app_prefix: app_prefix.into(),
            title: DEFAULT_TITLE.to_string(),
            message: DEFAULT_MESSAGE.to_string(),
            policy: RecoveryPolicy::default(),
            observer: None,
            sink: None,
            hang: HangConfig::default(),
            exit_code: 1,
            capture_panics: true,
            host: Arc::new(SystemHost),
        }
    }

    /// Create a configuration from loaded settings.
    pub fn from_settings(primary: impl IntoSharedContext, settings: &MonitorSettings) -> Self {
        Self::new(primary, settings.app_prefix.clone())
            .with_title(settings.title.clone())
            .with_message(settings.message.clone())
            .with_policy(settings.policy)
            .with_hang_config(HangConfig::from(settings))
            .with_exit_code(settings.exit_code)
            .with_capture_panics(settings.capture_panics)
    }

    /// Set the foreground identity reported until changed.
    ///
    /// Defaults to the primary context's own name.
    pub fn with_primary_name(mut self, name: impl Into<String>) -> Self {
        self.primary_name = Some(name.into());
        self
    }

    /// Set the application identity carried in reports.
    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
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

    /// Set the observer told about the report before recovery.
    ///
    /// The observer must not stop the session: it may run while a panic
    /// hook is executing, and the hook cannot be swapped at that point.
    pub fn with_observer(mut self, observer: Arc<dyn EventObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Set the telemetry sink.
    pub fn with_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set hang detection parameters.
    pub fn with_hang_config(mut self, hang: HangConfig) -> Self {
        self.hang = hang;
        self
    }

    /// Set the probe interval.
    pub fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.hang.probe_interval = interval;
        self
    }

    /// Set the hang threshold.
    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.hang.threshold = threshold;
        self
    }

    /// Set the exit code used by recovery.
    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    /// Enable or disable the process-wide panic hook.
    pub fn with_capture_panics(mut self, enabled: bool) -> Self {
        self.capture_panics = enabled;
        self
    }

    /// Set the process host used by recovery.
    pub fn with_host(mut self, host: Arc<dyn ProcessHost>) -> Self {
        self.host = host;
        self
    }

    /// The watched context.
    pub fn primary(&self) -> &SharedContext {
        &self.primary
    }

    /// The foreground identity used in reports.
    pub fn primary_name(&self) -> &str {
        self.primary_name
            .as_deref()
            .unwrap_or_else(|| self.primary.name())
    }

    /// The application prefix.
    pub fn app_prefix(&self) -> &str {
        &self.app_prefix
    }

    /// The recovery policy.
    pub fn policy(&self) -> RecoveryPolicy {
        self.policy
    }

    /// Hang detection parameters.
    pub fn hang_config(&self) -> &HangConfig {
        &self.hang
    }

    /// Check the configuration.
    pub fn validate(&self) -> MonitorResult<()> {
        if self.app_prefix.trim().is_empty() {
            return Err(MonitorError::InvalidConfig(
                "app_prefix must not be empty".to_string(),
            ));
        }
        self.hang.validate()?;
        Ok(())
    }
}

impl std::fmt::Debug for MonitorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorConfig")
            .field("primary", &self.primary.name())
            .field("primary_name", &self.primary_name)
            .field("application", &self.application)
            .field("app_prefix", &self.app_prefix)
            .field("policy", &self.policy)
            .field("hang", &self.hang)
            .field("exit_code", &self.exit_code)
            .field("capture_panics", &self.capture_panics)
            .field("has_observer", &self.observer.is_some())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloodhound_core::MainQueue;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let (queue, _loop) = MainQueue::new("main");
        let config = MonitorConfig::new(queue, "my_app");

        assert_eq!(config.primary_name(), "main");
        assert_eq!(config.policy(), RecoveryPolicy::Restart);
        assert_eq!(config.hang_config().threshold, Duration::from_millis(3000));
        assert!(config.capture_panics);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let (queue, _loop) = MainQueue::new("main");

        let empty = MonitorConfig::new(queue.clone(), "  ");
        assert!(matches!(empty.validate(), Err(MonitorError::InvalidConfig(_))));

        let inverted = MonitorConfig::new(queue, "my_app")
            .with_probe_interval(Duration::from_millis(500))
            .with_threshold(Duration::from_millis(100));
        assert!(matches!(inverted.validate(), Err(MonitorError::Detect(_))));
    }

    #[test]
    fn test_from_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "app_prefix = \"my_app\"\npolicy = \"terminate\"\nthreshold_ms = 1000\nexit_code = 7"
        )
        .unwrap();

        let settings = MonitorSettings::load(file.path()).unwrap();
        let (queue, _loop) = MainQueue::new("main");
        let config = MonitorConfig::from_settings(queue, &settings).with_primary_name("Home");

        assert_eq!(config.app_prefix(), "my_app");
        assert_eq!(config.policy(), RecoveryPolicy::Terminate);
        assert_eq!(config.hang_config().threshold, Duration::from_millis(1000));
        assert_eq!(config.exit_code, 7);
        assert_eq!(config.primary_name(), "Home");
        assert_eq!(config.title, DEFAULT_TITLE);
    }
}
