//! Bloodhound Hang Detection
//!
//! This crate detects when a primary context (a single-threaded task queue
//! such as an application's main loop) stops responding.
//!
//! # How it works
//!
//! A background thread posts a probe onto the context every period. Each
//! probe that runs resets an idle counter; the counter only reaches the
//! threshold when the context stops draining its queue altogether:
//!
//! ```text
//! detector thread          primary context
//!   elapsed += P
//!   post(probe) ─────────▶  [queue] ── probe runs: elapsed = 0, pending = false
//!   elapsed >= T && pending?  ── yes ──▶ on_hang(event), once per run
//!   sleep P (cancellable)
//!   pending = true
//! ```
//!
//! ```ignore
//! use bloodhound_detect::{HangConfig, HangDetector};
//!
//! let detector = HangDetector::new(context, HangConfig::default(), |event| {
//!     tracing::warn!(context = %event.context, "hang");
//! })?;
//! detector.start()?;
//! ```

pub mod error;
pub mod hang;

// Re-export main types
pub use error::{DetectError, DetectResult};
pub use hang::{HangCallback, HangConfig, HangDetector, HangEvent, HangStats};
