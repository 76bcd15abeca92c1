//! Bloodhound Core
//!
//! Shared building blocks for the Bloodhound application watchdog:
//!
//! - [`PrimaryContext`]: the single-threaded task queue being watched, with
//!   a channel-backed [`MainQueue`] implementation
//! - [`RecoveryPolicy`]: what happens to the process after a failure report
//! - [`MonitorSettings`]: serialisable monitor settings
//!
//! # Watching a main loop
//!
//! ```ignore
//! use bloodhound_core::prelude::*;
//!
//! let (queue, main_loop) = MainQueue::new("main");
//! // hand `queue` to the watchdog, then drive the loop on the main thread
//! main_loop.run();
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod recovery;

// Re-export main types at crate root
pub use config::{DEFAULT_MESSAGE, DEFAULT_TITLE, MonitorSettings};
#[cfg(feature = "async")]
pub use context::TokioContext;
pub use context::{IntoSharedContext, MainLoop, MainQueue, PrimaryContext, SharedContext, Task};
pub use error::{ContextError, ContextResult, CoreError, CoreResult};
pub use recovery::{HostAction, ProcessHost, RecordingHost, RecoveryPolicy, SystemHost};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::MonitorSettings;
    pub use crate::context::{IntoSharedContext, MainLoop, MainQueue, PrimaryContext, SharedContext};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::recovery::{ProcessHost, RecoveryPolicy, SystemHost};
}
