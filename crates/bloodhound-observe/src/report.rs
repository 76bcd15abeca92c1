//! Crash reports.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::PanicHookInfo;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TraceResult;
use crate::trace::{StackTrace, StackTraceAnalyzer};

/// Placeholder used when an identity is not known.
pub const UNKNOWN: &str = "unknown";

/// Fault kind used for hang reports.
pub const HANG_FAULT_KIND: &str = "ApplicationNotResponding";

/// Unique identifier for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(Uuid);

impl ReportId {
    /// Create a new random report ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a fault reached the watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultOrigin {
    /// Captured by the panic hook.
    Panic,
    /// The primary context stopped draining its queue.
    Hang,
    /// Handed over explicitly by the host.
    Delivered,
}

impl std::fmt::Display for FaultOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultOrigin::Panic => write!(f, "panic"),
            FaultOrigin::Hang => write!(f, "hang"),
            FaultOrigin::Delivered => write!(f, "delivered"),
        }
    }
}

/// A captured fault, before it is turned into a report.
#[derive(Debug, Clone)]
pub struct Fault {
    /// How the fault arrived.
    pub origin: FaultOrigin,
    /// Declared category of the fault.
    pub kind: String,
    /// Short human-readable description.
    pub message: String,
    /// Thread or task on which the fault occurred.
    pub task_name: String,
    /// Full, unfiltered fault text including any backtrace.
    pub raw_text: String,
}

impl Fault {
    /// Create a fault from its parts.
    pub fn new(
        origin: FaultOrigin,
        kind: impl Into<String>,
        message: impl Into<String>,
        task_name: impl Into<String>,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            origin,
            kind: kind.into(),
            message: message.into(),
            task_name: task_name.into(),
            raw_text: raw_text.into(),
        }
    }

    /// Capture a fault from inside a panic hook.
    ///
    /// Runs on the panicking thread; the backtrace is captured regardless of
    /// `RUST_BACKTRACE`.
    pub fn from_panic_hook(info: &PanicHookInfo<'_>) -> Self {
        let backtrace = Backtrace::force_capture();
        let task_name = current_task_name();
        let message = payload_message(info.payload());
        let location = info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()));

        let mut raw_text = match &location {
            Some(loc) => format!("thread '{task_name}' panicked at {loc}:\n{message}\n"),
            None => format!("thread '{task_name}' panicked:\n{message}\n"),
        };
        raw_text.push_str("stack backtrace:\n");
        raw_text.push_str(&backtrace.to_string());

        Self::new(FaultOrigin::Panic, "panic", message, task_name, raw_text)
    }

    /// Build a fault from a caught panic payload, such as the result of
    /// `catch_unwind` or a panicked task's join error.
    pub fn from_panic_payload(payload: &(dyn Any + Send), task_name: impl Into<String>) -> Self {
        let task_name = task_name.into();
        let message = payload_message(payload);
        let raw_text = format!("task '{task_name}' panicked:\n{message}\n");
        Self::new(FaultOrigin::Delivered, "panic", message, task_name, raw_text)
    }

    /// Build a fault from an error that escaped a task.
    ///
    /// The kind is the error's type name; the raw text carries the full
    /// source chain and a backtrace when `RUST_BACKTRACE` enables one.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + 'static,
    {
        let kind = short_type_name(std::any::type_name::<E>());
        let message = error.to_string();

        let mut raw_text = format!("{kind}: {message}\n");
        let mut source = error.source();
        while let Some(cause) = source {
            raw_text.push_str(&format!("Caused by: {cause}\n"));
            source = cause.source();
        }
        let backtrace = Backtrace::capture();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            raw_text.push_str("stack backtrace:\n");
            raw_text.push_str(&backtrace.to_string());
        }

        Self::new(FaultOrigin::Delivered, kind, message, current_task_name(), raw_text)
    }

    /// Describe a primary context that stopped draining its queue.
    pub fn hang(context_name: &str, idle: Duration, threshold: Duration) -> Self {
        let message = format!(
            "primary context '{context_name}' has not drained a probe for {}ms (threshold {}ms)",
            idle.as_millis(),
            threshold.as_millis()
        );
        let raw_text = format!("{HANG_FAULT_KIND}: {message}\n");
        Self::new(FaultOrigin::Hang, HANG_FAULT_KIND, message, context_name, raw_text)
    }
}

/// Name of the thread the caller runs on, or its id when unnamed.
pub fn current_task_name() -> String {
    let thread = std::thread::current();
    match thread.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", thread.id()),
    }
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

fn short_type_name(full: &str) -> String {
    // Strip module paths but keep generic arguments readable.
    let base = full.split('<').next().unwrap_or(full);
    let short = base.rsplit("::").next().unwrap_or(base);
    match full.find('<') {
        Some(idx) => format!("{short}{}", &full[idx..]),
        None => short.to_string(),
    }
}

/// Complete, immutable report of one fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrashReport {
    /// Unique report ID.
    pub report_id: ReportId,
    /// How the fault arrived.
    pub origin: FaultOrigin,
    /// Foreground context active when the fault occurred.
    pub primary_context_name: String,
    /// Application identity, when configured.
    pub application: Option<String>,
    /// Thread or task on which the fault occurred.
    pub faulting_task_name: String,
    /// Declared category of the fault.
    pub fault_kind: String,
    /// Application frames extracted from the raw text.
    pub trace: StackTrace,
    /// Full, unfiltered fault text.
    pub raw_text: String,
    /// Title to display with the report.
    pub title: String,
    /// Message to display with the report.
    pub message: String,
    /// Capture time in milliseconds since the Unix epoch.
    pub captured_at_ms: u64,
    /// Whether this is the minimal fallback report.
    pub degraded: bool,
}

impl CrashReport {
    /// Minimal report carrying only the raw fault text.
    ///
    /// Used when regular assembly fails.
    pub fn minimal(fault: &Fault) -> Self {
        Self {
            report_id: ReportId::new(),
            origin: fault.origin,
            primary_context_name: UNKNOWN.to_string(),
            application: None,
            faulting_task_name: UNKNOWN.to_string(),
            fault_kind: UNKNOWN.to_string(),
            trace: StackTrace::default(),
            raw_text: fault.raw_text.clone(),
            title: String::new(),
            message: String::new(),
            captured_at_ms: now_ms(),
            degraded: true,
        }
    }

    /// One-line summary.
    pub fn summary(&self) -> String {
        match self.trace.top() {
            Some(frame) => format!(
                "{} on '{}' in {} at {}",
                self.fault_kind, self.faulting_task_name, self.primary_context_name, frame
            ),
            None => format!(
                "{} on '{}' in {}",
                self.fault_kind, self.faulting_task_name, self.primary_context_name
            ),
        }
    }

    /// Format as human-readable text.
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Crash Report: {}\n", self.report_id));
        if !self.title.is_empty() {
            output.push_str(&format!("{}\n", self.title));
        }
        if !self.message.is_empty() {
            output.push_str(&format!("{}\n", self.message));
        }
        output.push('\n');

        output.push_str(&format!("Origin: {}\n", self.origin));
        output.push_str(&format!("Fault: {}\n", self.fault_kind));
        output.push_str(&format!("Context: {}\n", self.primary_context_name));
        if let Some(app) = &self.application {
            output.push_str(&format!("Application: {}\n", app));
        }
        output.push_str(&format!("Task: {}\n", self.faulting_task_name));

        if self.trace.is_empty() {
            output.push_str("\nNo application frames found.\n");
        } else {
            output.push_str("\nApplication frames:\n");
            for frame in self.trace.frames() {
                output.push_str(&format!("  {}\n", frame));
            }
        }

        output.push_str("\nRaw trace:\n");
        output.push_str(&self.raw_text);
        if !self.raw_text.ends_with('\n') {
            output.push('\n');
        }

        output
    }

    /// Format as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Format as pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Turns captured faults into reports.
pub trait AssembleReport: Send + Sync {
    /// Build the report for `fault`, given the foreground context identity
    /// active at fault time.
    fn assemble(&self, fault: &Fault, primary_context: Option<&str>) -> CrashReport;
}

/// Standard report assembler.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    analyzer: StackTraceAnalyzer,
    application: Option<String>,
    title: String,
    message: String,
}

impl ReportAssembler {
    /// Create an assembler keeping frames under `app_prefix`.
    pub fn new(app_prefix: &str) -> TraceResult<Self> {
        Ok(Self {
            analyzer: StackTraceAnalyzer::new(app_prefix)?,
            application: None,
            title: String::new(),
            message: String::new(),
        })
    }

    /// Set the application identity carried in reports.
    pub fn with_application(mut self, application: Option<String>) -> Self {
        self.application = application;
        self
    }

    /// Set the title carried in reports.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the message carried in reports.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// The analyzer used for frame filtering.
    pub fn analyzer(&self) -> &StackTraceAnalyzer {
        &self.analyzer
    }
}

impl AssembleReport for ReportAssembler {
    fn assemble(&self, fault: &Fault, primary_context: Option<&str>) -> CrashReport {
        CrashReport {
            report_id: ReportId::new(),
            origin: fault.origin,
            primary_context_name: primary_context.unwrap_or(UNKNOWN).to_string(),
            application: self.application.clone(),
            faulting_task_name: fault.task_name.clone(),
            fault_kind: fault.kind.clone(),
            trace: self.analyzer.analyze(&fault.raw_text),
            raw_text: fault.raw_text.clone(),
            title: self.title.clone(),
            message: self.message.clone(),
            captured_at_ms: now_ms(),
            degraded: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::Frame;

    fn sample_fault() -> Fault {
        Fault::new(
            FaultOrigin::Delivered,
            "IllegalStateException",
            "boom",
            "worker-1",
            "IllegalStateException: boom\n\tat com.app.Foo.bar(Foo.kt:42)\n\tat android.os.Handler.run(Handler.java:10)",
        )
    }

    #[test]
    fn test_report_id() {
        assert_ne!(ReportId::new(), ReportId::new());
    }

    #[test]
    fn test_assemble_report() {
        let assembler = ReportAssembler::new("com.app")
            .unwrap()
            .with_application(Some("com.app".to_string()))
            .with_title("App Crashed");

        let report = assembler.assemble(&sample_fault(), Some("MainActivity"));

        assert_eq!(report.primary_context_name, "MainActivity");
        assert_eq!(report.faulting_task_name, "worker-1");
        assert_eq!(report.fault_kind, "IllegalStateException");
        assert_eq!(report.trace.frames(), &[Frame::new("bar", "Foo.kt", 42)]);
        assert!(report.raw_text.contains("Handler.java"));
        assert!(!report.degraded);
    }

    #[test]
    fn test_unknown_primary_context() {
        let assembler = ReportAssembler::new("com.app").unwrap();
        let report = assembler.assemble(&sample_fault(), None);
        assert_eq!(report.primary_context_name, UNKNOWN);
    }

    #[test]
    fn test_minimal_report() {
        let report = CrashReport::minimal(&sample_fault());
        assert!(report.degraded);
        assert!(report.trace.is_empty());
        assert_eq!(report.fault_kind, UNKNOWN);
        assert!(report.raw_text.starts_with("IllegalStateException"));
    }

    #[test]
    fn test_hang_fault() {
        let fault = Fault::hang("main", Duration::from_millis(3200), Duration::from_secs(3));
        assert_eq!(fault.origin, FaultOrigin::Hang);
        assert_eq!(fault.kind, HANG_FAULT_KIND);
        assert_eq!(fault.task_name, "main");
        assert!(fault.message.contains("3200ms"));
    }

    #[test]
    fn test_fault_from_error() {
        let error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let fault = Fault::from_error(&error);

        assert_eq!(fault.kind, "Error");
        assert_eq!(fault.message, "missing file");
        assert!(fault.raw_text.starts_with("Error: missing file"));
    }

    #[test]
    fn test_fault_from_panic_payload() {
        let result: std::thread::Result<()> = std::panic::catch_unwind(|| panic!("exploded"));
        let payload = result.unwrap_err();
        let fault = Fault::from_panic_payload(payload.as_ref(), "job-7");

        assert_eq!(fault.message, "exploded");
        assert_eq!(fault.task_name, "job-7");
        assert_eq!(fault.kind, "panic");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("std::io::error::Error"), "Error");
        assert_eq!(short_type_name("my_app::Wrapper<u8>"), "Wrapper<u8>");
    }

    #[test]
    fn test_report_to_text_and_json() {
        let assembler = ReportAssembler::new("com.app").unwrap();
        let report = assembler.assemble(&sample_fault(), Some("MainActivity"));

        let text = report.to_text();
        assert!(text.contains("MainActivity"));
        assert!(text.contains("bar (Foo.kt:42)"));

        let json = report.to_json();
        assert_eq!(json["fault_kind"], "IllegalStateException");
        assert_eq!(json["origin"], "delivered");

        let parsed: CrashReport = serde_json::from_str(&report.to_json_pretty()).unwrap();
        assert_eq!(parsed, report);
    }
}
