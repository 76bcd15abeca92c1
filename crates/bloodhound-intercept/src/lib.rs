//! Bloodhound Fault Interception
//!
//! Funnels every captured failure, whether a panic, a detected hang or an
//! error delivered by the application, into a single report per session.
//!
//! - [`FaultInterceptor`]: single-fire report pipeline followed by recovery
//! - [`PanicHookGuard`]: owns the process panic hook while installed
//!
//! The pipeline order is fixed: assemble the report, notify the observer,
//! forward to telemetry, then apply the recovery policy.
//!
//! ```ignore
//! use std::sync::Arc;
//! use bloodhound_intercept::{FaultInterceptor, PanicHookGuard};
//! use bloodhound_observe::ReportAssembler;
//!
//! let interceptor = Arc::new(FaultInterceptor::new(ReportAssembler::new("my_app")?));
//! let _guard = PanicHookGuard::install(Arc::clone(&interceptor))?;
//! ```

pub mod error;
pub mod hook;
pub mod interceptor;

pub use error::{InterceptError, InterceptResult};
pub use hook::PanicHookGuard;
pub use interceptor::{Delivery, FaultInterceptor, InterceptorStats};
