//! # Bloodhound - Application Watchdog
//!
//! Bloodhound watches an application's main loop and its threads, and turns
//! the first failure it sees into a structured crash report:
//!
//! - **Hangs**: the main loop stops draining its queue for longer than a
//!   threshold
//! - **Panics**: any thread panics while the panic hook is installed
//! - **Delivered faults**: errors or panic payloads the application hands
//!   over explicitly, e.g. from async tasks
//!
//! Exactly one report is produced per session. It is handed to an observer,
//! forwarded to an optional telemetry sink, and followed by the recovery
//! policy (restart or terminate).
//!
//! ## Quick Start
//!
//! ```ignore
//! use bloodhound::prelude::*;
//!
//! let (queue, main_loop) = MainQueue::new("main");
//!
//! let config = MonitorConfig::new(queue, "my_app")
//!     .with_policy(RecoveryPolicy::Terminate)
//!     .with_observer(Arc::new(LoggingObserver::new()));
//!
//! let session = MonitorSession::new(config)?;
//! session.start()?;
//!
//! main_loop.run();
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                     Your Application                      │
//! ├───────────────────────────────────────────────────────────┤
//! │   bloodhound (facade): MonitorSession, LifecycleMonitor   │
//! │                                                           │
//! │  ┌──────────────────┐        ┌──────────────────────┐     │
//! │  │ bloodhound-detect│ hang ─▶│ bloodhound-intercept │◀─ panic hook
//! │  │  (HangDetector)  │        │  (FaultInterceptor)  │     │
//! │  └──────────────────┘        └──────────┬───────────┘     │
//! │                                         ▼                 │
//! │  ┌──────────────────────────────────────────────────┐     │
//! │  │ bloodhound-observe: report, trace, observer/sink │     │
//! │  └──────────────────────────────────────────────────┘     │
//! ├───────────────────────────────────────────────────────────┤
//! │  bloodhound-core: PrimaryContext, RecoveryPolicy, config  │
//! └───────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod session;

// Re-export from sub-crates
pub use bloodhound_core;
pub use bloodhound_detect;
pub use bloodhound_intercept;
pub use bloodhound_observe;

pub use config::MonitorConfig;
pub use error::{MonitorError, MonitorResult};
pub use lifecycle::{LifecycleEvent, LifecycleMonitor};
pub use session::{MonitorSession, SessionStats};

/// Prelude module for convenient imports.
pub mod prelude {
    // Main types
    pub use crate::{
        LifecycleEvent, LifecycleMonitor, MonitorConfig, MonitorError, MonitorResult,
        MonitorSession, SessionStats,
    };

    // Core types
    pub use bloodhound_core::{
        IntoSharedContext, MainLoop, MainQueue, MonitorSettings, PrimaryContext, ProcessHost,
        RecordingHost, RecoveryPolicy, SharedContext, SystemHost,
    };

    #[cfg(feature = "async")]
    pub use bloodhound_core::TokioContext;

    // Detection
    pub use bloodhound_detect::{HangConfig, HangStats};

    // Interception
    pub use bloodhound_intercept::{Delivery, InterceptorStats};

    // Reports
    pub use bloodhound_observe::{
        CollectingObserver, CrashReport, EventObserver, Fault, FaultOrigin, JsonLinesSink,
        LoggingObserver, StackTrace, TelemetrySink,
    };

    // Std re-exports for convenience
    pub use std::sync::Arc;
    pub use std::time::Duration;
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let (queue, _main_loop) = MainQueue::new("main");
        let config = MonitorConfig::new(queue, "my_app")
            .with_hang_config(HangConfig::strict())
            .with_observer(Arc::new(LoggingObserver::new()))
            .with_capture_panics(false);
        let session = MonitorSession::new(config).unwrap();
        assert!(!session.is_running());
    }
}
