//! Single-fire fault interception.
//!
//! The interceptor turns the first fault it sees into a report, notifies the
//! observer and the telemetry sink, then applies the recovery policy. Every
//! later fault, whether concurrent or raised while reporting, is swallowed.

use std::panic::{self, AssertUnwindSafe, PanicHookInfo};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

use parking_lot::RwLock;
use tracing::{debug, warn};

use bloodhound_core::{ProcessHost, RecoveryPolicy, SystemHost};
use bloodhound_observe::{AssembleReport, CrashReport, EventObserver, Fault, TelemetrySink};

/// Outcome of handing a fault to the interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The fault was reported and recovery applied.
    Reported,
    /// A report already fired; the fault was dropped.
    Suppressed,
}

/// Reports the first fault of a session and applies recovery.
pub struct FaultInterceptor {
    assembler: Arc<dyn AssembleReport>,
    observer: Option<Arc<dyn EventObserver>>,
    sink: Option<Arc<dyn TelemetrySink>>,
    policy: RecoveryPolicy,
    host: Arc<dyn ProcessHost>,
    exit_code: i32,
    primary_context: RwLock<Option<String>>,
    fired: AtomicBool,
    faults_received: AtomicU64,
    faults_suppressed: AtomicU64,
    last_report: RwLock<Option<CrashReport>>,
}

impl FaultInterceptor {
    /// Create an interceptor using `assembler` to build reports.
    ///
    /// Defaults to the restart policy on the system host.
    pub fn new<A>(assembler: A) -> Self
    where
        A: AssembleReport + 'static,
    {
        Self {
            assembler: Arc::new(assembler),
            observer: None,
            sink: None,
            policy: RecoveryPolicy::default(),
            host: Arc::new(SystemHost),
            exit_code: 1,
            primary_context: RwLock::new(None),
            fired: AtomicBool::new(false),
            faults_received: AtomicU64::new(0),
            faults_suppressed: AtomicU64::new(0),
            last_report: RwLock::new(None),
        }
    }

    /// Set the observer notified with the report.
    pub fn with_observer(mut self, observer: Option<Arc<dyn EventObserver>>) -> Self {
        self.observer = observer;
        self
    }

    /// Set the telemetry sink.
    pub fn with_sink(mut self, sink: Option<Arc<dyn TelemetrySink>>) -> Self {
        self.sink = sink;
        self
    }

    /// Set the recovery policy.
    pub fn with_policy(mut self, policy: RecoveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the process host used by recovery.
    pub fn with_host(mut self, host: Arc<dyn ProcessHost>) -> Self {
        self.host = host;
        self
    }

    /// Set the exit code used by recovery.
    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    /// Set the initial foreground context identity.
    pub fn with_primary_context(self, name: Option<String>) -> Self {
        *self.primary_context.write() = name;
        self
    }

    /// Update the foreground context identity used in future reports.
    pub fn set_primary_context(&self, name: Option<String>) {
        *self.primary_context.write() = name;
    }

    /// The current foreground context identity.
    pub fn primary_context(&self) -> Option<String> {
        self.primary_context.read().clone()
    }

    /// The configured recovery policy.
    pub fn policy(&self) -> RecoveryPolicy {
        self.policy
    }

    /// Hand a fault to the interceptor.
    ///
    /// Only the first call after construction or [`reset`](Self::reset)
    /// reports; it returns after recovery has been applied, which with the
    /// system host means it does not return at all.
    pub fn intercept(&self, fault: Fault) -> Delivery {
        self.faults_received.fetch_add(1, Ordering::Relaxed);

        if self
            .fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            self.faults_suppressed.fetch_add(1, Ordering::Relaxed);
            debug!(
                origin = %fault.origin,
                kind = %fault.kind,
                task = %fault.task_name,
                "Fault suppressed; a report already fired"
            );
            return Delivery::Suppressed;
        }

        warn!(
            origin = %fault.origin,
            kind = %fault.kind,
            task = %fault.task_name,
            message = %fault.message,
            "Fault intercepted"
        );

        let report = self.build_report(&fault);
        *self.last_report.write() = Some(report.clone());
        self.notify(&report);

        self.policy.apply(self.host.as_ref(), self.exit_code);
        Delivery::Reported
    }

    /// Handle a panic from inside the process-wide panic hook.
    ///
    /// A panic raised inside a panic hook aborts the process, so the report
    /// is produced on a separate reporter thread that this call joins.
    /// Panics raised while reporting come back through the hook and are
    /// suppressed.
    pub fn handle_panic(self: &Arc<Self>, info: &PanicHookInfo<'_>) {
        let fault = Fault::from_panic_hook(info);
        if self.has_fired() {
            self.intercept(fault);
            return;
        }

        let interceptor = Arc::clone(self);
        let fallback = fault.clone();
        let spawned = thread::Builder::new()
            .name("bloodhound-reporter".to_string())
            .spawn(move || interceptor.intercept(fault));

        match spawned {
            Ok(handle) => {
                let _ = handle.join();
            }
            Err(e) => {
                warn!(error = %e, "Cannot spawn reporter thread; reporting inline");
                self.intercept(fallback);
            }
        }
    }

    /// Re-arm the interceptor for a new session.
    pub fn reset(&self) {
        self.fired.store(false, Ordering::SeqCst);
        self.faults_received.store(0, Ordering::Relaxed);
        self.faults_suppressed.store(0, Ordering::Relaxed);
        *self.last_report.write() = None;
    }

    /// Whether a report has fired since the last reset.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// The report produced since the last reset, if any.
    pub fn last_report(&self) -> Option<CrashReport> {
        self.last_report.read().clone()
    }

    /// Get a snapshot of interception statistics.
    pub fn stats(&self) -> InterceptorStats {
        InterceptorStats {
            faults_received: self.faults_received.load(Ordering::Relaxed),
            faults_suppressed: self.faults_suppressed.load(Ordering::Relaxed),
            fired: self.has_fired(),
        }
    }

    fn build_report(&self, fault: &Fault) -> CrashReport {
        let primary = self.primary_context();
        let assembled = panic::catch_unwind(AssertUnwindSafe(|| {
            self.assembler.assemble(fault, primary.as_deref())
        }));

        match assembled {
            Ok(report) => report,
            Err(_) => {
                warn!("Report assembly failed; using minimal report");
                CrashReport::minimal(fault)
            }
        }
    }

    fn notify(&self, report: &CrashReport) {
        if let Some(observer) = &self.observer {
            let notified = panic::catch_unwind(AssertUnwindSafe(|| observer.on_report(report)));
            if notified.is_err() {
                warn!(report_id = %report.report_id, "Observer panicked while handling report");
            }
        }

        if let Some(sink) = &self.sink {
            match panic::catch_unwind(AssertUnwindSafe(|| sink.forward(report))) {
                Ok(Ok(())) => debug!(sink = sink.name(), "Report forwarded"),
                Ok(Err(e)) => warn!(sink = sink.name(), error = %e, "Telemetry forwarding failed"),
                Err(_) => warn!(sink = sink.name(), "Telemetry sink panicked"),
            }
        }
    }
}

impl std::fmt::Debug for FaultInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultInterceptor")
            .field("policy", &self.policy)
            .field("exit_code", &self.exit_code)
            .field("fired", &self.has_fired())
            .field("has_observer", &self.observer.is_some())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

/// Statistics snapshot from an interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterceptorStats {
    /// Faults handed to the interceptor since the last reset.
    pub faults_received: u64,
    /// Faults dropped by the single-fire guard.
    pub faults_suppressed: u64,
    /// Whether a report has fired.
    pub fired: bool,
}
