//! Bloodhound Observability
//!
//! This crate turns captured faults into structured reports and hands them
//! to interested parties:
//!
//! - [`StackTraceAnalyzer`]: keeps only the application's own frames
//! - [`ReportAssembler`]: builds an immutable [`CrashReport`] from a [`Fault`]
//! - [`EventObserver`] and [`TelemetrySink`]: report consumers
//!
//! # Filtering a trace
//!
//! ```ignore
//! use bloodhound_observe::analyze;
//!
//! let trace = analyze("com.app.Foo.bar(Foo.kt:42)", "com.app");
//! assert_eq!(trace.line_numbers(), &[42]);
//! ```
//!
//! # Assembling a report
//!
//! ```ignore
//! use bloodhound_observe::{AssembleReport, Fault, ReportAssembler};
//!
//! let assembler = ReportAssembler::new("my_app")?.with_title("App Crashed");
//! let report = assembler.assemble(&fault, Some("main"));
//! println!("{}", report.to_text());
//! ```

pub mod error;
pub mod events;
pub mod report;
pub mod trace;

// Re-export main types
pub use error::{SinkError, SinkResult, TraceError, TraceResult};
pub use events::{
    CollectingObserver, EventObserver, FailingSink, JsonLinesSink, LoggingObserver, TelemetrySink,
};
pub use report::{
    AssembleReport, CrashReport, Fault, FaultOrigin, HANG_FAULT_KIND, ReportAssembler, ReportId,
    UNKNOWN, current_task_name,
};
pub use trace::{Frame, StackTrace, StackTraceAnalyzer, analyze};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::events::{EventObserver, TelemetrySink};
    pub use crate::report::{AssembleReport, CrashReport, Fault, ReportAssembler};
    pub use crate::trace::{StackTrace, StackTraceAnalyzer};
}
