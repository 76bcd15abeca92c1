//! Report observers and telemetry sinks.
//!
//! An [`EventObserver`] is told about the report synchronously, before any
//! recovery happens. A [`TelemetrySink`] forwards the same report to an
//! external system on a best-effort basis; its failures never block
//! recovery.

use std::io::Write;

use parking_lot::{Mutex, RwLock};

use crate::error::{SinkError, SinkResult};
use crate::report::CrashReport;

/// Receives the report of a captured failure.
pub trait EventObserver: Send + Sync {
    /// Called once per session with the assembled report.
    fn on_report(&self, report: &CrashReport);
}

impl<F> EventObserver for F
where
    F: Fn(&CrashReport) + Send + Sync,
{
    fn on_report(&self, report: &CrashReport) {
        self(report)
    }
}

/// Forwards reports to an external crash-telemetry service.
pub trait TelemetrySink: Send + Sync {
    /// Deliver the report.
    fn forward(&self, report: &CrashReport) -> SinkResult<()>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "telemetry"
    }
}

/// Observer that logs each report through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl LoggingObserver {
    /// Create a new logging observer.
    pub fn new() -> Self {
        Self
    }
}

impl EventObserver for LoggingObserver {
    fn on_report(&self, report: &CrashReport) {
        let top_frame = report.trace.top().map(|f| f.to_string());
        tracing::error!(
            event = "crash_report",
            report_id = %report.report_id,
            origin = %report.origin,
            fault_kind = %report.fault_kind,
            context = %report.primary_context_name,
            task = %report.faulting_task_name,
            frames = report.trace.len(),
            top_frame = ?top_frame,
            degraded = report.degraded,
            "Failure captured"
        );
    }
}

/// Observer that keeps reports for later inspection.
pub struct CollectingObserver {
    reports: RwLock<Vec<CrashReport>>,
    max_reports: usize,
}

impl CollectingObserver {
    /// Create a collector holding at most `max_reports` reports.
    pub fn new(max_reports: usize) -> Self {
        Self {
            reports: RwLock::new(Vec::new()),
            max_reports,
        }
    }

    /// Get collected reports.
    pub fn reports(&self) -> Vec<CrashReport> {
        self.reports.read().clone()
    }

    /// Get report count.
    pub fn len(&self) -> usize {
        self.reports.read().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.reports.read().is_empty()
    }

    /// Clear collected reports.
    pub fn clear(&self) {
        self.reports.write().clear();
    }
}

impl Default for CollectingObserver {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventObserver for CollectingObserver {
    fn on_report(&self, report: &CrashReport) {
        let mut reports = self.reports.write();
        if reports.len() < self.max_reports {
            reports.push(report.clone());
        }
    }
}

impl TelemetrySink for CollectingObserver {
    fn forward(&self, report: &CrashReport) -> SinkResult<()> {
        self.on_report(report);
        Ok(())
    }

    fn name(&self) -> &str {
        "collector"
    }
}

/// Sink writing one JSON report per line.
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
    name: String,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Create a sink writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            name: "json-lines".to_string(),
        }
    }

    /// Set the name used in logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Consume the sink and return its writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> TelemetrySink for JsonLinesSink<W> {
    fn forward(&self, report: &CrashReport) -> SinkResult<()> {
        let line = serde_json::to_string(report)?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Sink that always fails; handy for exercising failure paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingSink;

impl TelemetrySink for FailingSink {
    fn forward(&self, _report: &CrashReport) -> SinkResult<()> {
        Err(SinkError::Failed {
            sink: self.name().to_string(),
            reason: "sink unavailable".to_string(),
        })
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Fault, FaultOrigin};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn report() -> CrashReport {
        CrashReport::minimal(&Fault::new(
            FaultOrigin::Delivered,
            "panic",
            "boom",
            "main",
            "boom",
        ))
    }

    #[test]
    fn test_closure_observer() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let observer = move |_: &CrashReport| {
            counter.fetch_add(1, Ordering::SeqCst);
        };

        observer.on_report(&report());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_collecting_observer_max_reports() {
        let observer = CollectingObserver::new(2);
        for _ in 0..5 {
            observer.on_report(&report());
        }
        assert_eq!(observer.len(), 2);

        observer.clear();
        assert!(observer.is_empty());
    }

    #[test]
    fn test_json_lines_sink() {
        let sink = JsonLinesSink::new(Vec::new());
        sink.forward(&report()).unwrap();
        sink.forward(&report()).unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: CrashReport = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.raw_text, "boom");
    }

    #[test]
    fn test_failing_sink() {
        let err = FailingSink.forward(&report()).unwrap_err();
        assert!(err.to_string().contains("failing"));
    }
}
