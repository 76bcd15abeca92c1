//! Monitor session: the hang detector and the fault interceptor as a pair.

use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info};

use bloodhound_core::RecoveryPolicy;
use bloodhound_detect::{HangDetector, HangEvent, HangStats};
use bloodhound_intercept::{Delivery, FaultInterceptor, InterceptorStats, PanicHookGuard};
use bloodhound_observe::{CrashReport, Fault, ReportAssembler};

use crate::config::MonitorConfig;
use crate::error::MonitorResult;

/// A watchdog session over one primary context.
///
/// `Stopped → Running → Stopped`. While running, the first hang or fault
/// is reported exactly once and followed by the recovery policy. Stopping
/// and starting again re-arms the session.
pub struct MonitorSession {
    config: MonitorConfig,
    interceptor: Arc<FaultInterceptor>,
    detector: HangDetector,
    hook: Mutex<Option<PanicHookGuard>>,
    running: AtomicBool,
    starts: AtomicU64,
}

impl MonitorSession {
    /// Validate `config` and build a stopped session.
    pub fn new(config: MonitorConfig) -> MonitorResult<Self> {
        config.validate()?;

        let assembler = ReportAssembler::new(&config.app_prefix)?
            .with_application(config.application.clone())
            .with_title(config.title.clone())
            .with_message(config.message.clone());

        let interceptor = Arc::new(
            FaultInterceptor::new(assembler)
                .with_observer(config.observer.clone())
                .with_sink(config.sink.clone())
                .with_policy(config.policy)
                .with_host(Arc::clone(&config.host))
                .with_exit_code(config.exit_code)
                .with_primary_context(Some(config.primary_name().to_string())),
        );

        let hang_interceptor = Arc::clone(&interceptor);
        let detector = HangDetector::new(
            Arc::clone(&config.primary),
            config.hang.clone(),
            move |event: HangEvent| {
                hang_interceptor.intercept(Fault::hang(&event.context, event.idle, event.threshold));
            },
        )?;

        Ok(Self {
            config,
            interceptor,
            detector,
            hook: Mutex::new(None),
            running: AtomicBool::new(false),
            starts: AtomicU64::new(0),
        })
    }

    /// Start watching.
    ///
    /// Does nothing while already running. Each start re-arms single-fire
    /// reporting and resets the detector counters.
    pub fn start(&self) -> MonitorResult<()> {
        // The hook slot doubles as the transition lock; `running` only
        // changes while it is held.
        let mut hook = self.hook.lock();
        if self.running.load(Ordering::SeqCst) {
            return Ok(()); // Already running
        }

        self.interceptor.reset();

        if self.config.capture_panics {
            *hook = Some(PanicHookGuard::install(Arc::clone(&self.interceptor))?);
        }

        if let Err(e) = self.detector.start() {
            if let Some(guard) = hook.take() {
                guard.uninstall();
            }
            return Err(e.into());
        }

        self.running.store(true, Ordering::SeqCst);
        self.starts.fetch_add(1, Ordering::Relaxed);
        info!(
            context = self.config.primary.name(),
            app_prefix = %self.config.app_prefix,
            policy = %self.config.policy,
            capture_panics = self.config.capture_panics,
            "Monitor session started"
        );

        Ok(())
    }

    /// Stop watching and restore the previous panic hook.
    ///
    /// The detector thread is joined after the transition lock is released.
    pub fn stop(&self) {
        let pending = {
            let mut hook = self.hook.lock();
            if !self.running.swap(false, Ordering::SeqCst) {
                return; // Not running
            }

            if let Some(guard) = hook.take() {
                guard.uninstall();
            }
            self.detector.request_stop()
        };

        if let Some(pending) = pending {
            pending.wait();
        }

        info!(context = self.config.primary.name(), "Monitor session stopped");
    }

    /// Check if the session is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Deliver a fault caught by the application, e.g. a panic payload
    /// from a joined task.
    ///
    /// Ignored while the session is stopped.
    pub fn report_fault(&self, fault: Fault) -> Delivery {
        if !self.is_running() {
            debug!(kind = %fault.kind, "Fault delivered to a stopped session; ignored");
            return Delivery::Suppressed;
        }
        self.interceptor.intercept(fault)
    }

    /// Deliver an error that ends the application's work.
    pub fn report_error<E>(&self, error: &E) -> Delivery
    where
        E: Error + 'static,
    {
        self.report_fault(Fault::from_error(error))
    }

    /// Change the foreground identity used in future reports.
    pub fn set_primary_name(&self, name: impl Into<String>) {
        self.interceptor.set_primary_context(Some(name.into()));
    }

    /// The foreground identity used in reports.
    pub fn primary_name(&self) -> Option<String> {
        self.interceptor.primary_context()
    }

    /// The session configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// The recovery policy.
    pub fn policy(&self) -> RecoveryPolicy {
        self.config.policy
    }

    /// The report produced in the current run, if any.
    pub fn last_report(&self) -> Option<CrashReport> {
        self.interceptor.last_report()
    }

    /// Get a statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            running: self.is_running(),
            starts: self.starts.load(Ordering::Relaxed),
            hang: self.detector.stats(),
            interceptor: self.interceptor.stats(),
        }
    }
}

impl Drop for MonitorSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for MonitorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorSession")
            .field("context", &self.config.primary.name())
            .field("running", &self.is_running())
            .field("hook_installed", &self.hook.lock().is_some())
            .finish()
    }
}

/// Statistics snapshot from a session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Whether the session is running.
    pub running: bool,
    /// Number of times the session was started.
    pub starts: u64,
    /// Hang detector statistics for the current run.
    pub hang: HangStats,
    /// Interception statistics for the current run.
    pub interceptor: InterceptorStats,
}
