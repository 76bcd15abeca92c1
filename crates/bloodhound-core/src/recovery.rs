//! Recovery policies applied after a failure has been reported.
//!
//! Recovery runs exactly once per session, after the observer has seen the
//! report. Every policy ends the current process; `Restart` launches a fresh
//! instance first. Process control goes through [`ProcessHost`] so that
//! embedders and tests can substitute their own.

use std::process::Command;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CoreError, CoreResult};

/// What to do with the process once a failure has been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPolicy {
    /// Relaunch the application, then end the current instance.
    #[default]
    Restart,
    /// End the process.
    Terminate,
}

impl RecoveryPolicy {
    /// Apply the policy through `host`.
    ///
    /// A failed relaunch is logged and the process is terminated anyway.
    pub fn apply(self, host: &dyn ProcessHost, exit_code: i32) {
        match self {
            RecoveryPolicy::Terminate => {
                info!(exit_code, "Terminating after failure report");
            }
            RecoveryPolicy::Restart => match host.relaunch() {
                Ok(()) => info!(exit_code, "Relaunched application; ending this instance"),
                Err(e) => warn!(error = %e, "Relaunch failed; terminating anyway"),
            },
        }

        host.terminate(exit_code);
    }
}

impl std::fmt::Display for RecoveryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoveryPolicy::Restart => write!(f, "restart"),
            RecoveryPolicy::Terminate => write!(f, "terminate"),
        }
    }
}

/// Process control used by recovery.
pub trait ProcessHost: Send + Sync {
    /// Start a fresh instance of the application.
    fn relaunch(&self) -> CoreResult<()>;

    /// End the current process with `exit_code`.
    ///
    /// The system host never returns from this call.
    fn terminate(&self, exit_code: i32);
}

/// Host backed by the operating system.
///
/// Relaunch re-executes the current binary with the original arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl ProcessHost for SystemHost {
    fn relaunch(&self) -> CoreResult<()> {
        let exe = std::env::current_exe().map_err(CoreError::Relaunch)?;
        let child = Command::new(&exe)
            .args(std::env::args_os().skip(1))
            .spawn()
            .map_err(CoreError::Relaunch)?;

        info!(exe = %exe.display(), pid = child.id(), "Spawned replacement process");
        Ok(())
    }

    fn terminate(&self, exit_code: i32) {
        std::process::exit(exit_code);
    }
}

/// An action recorded by [`RecordingHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    /// A relaunch was requested.
    Relaunch,
    /// Termination was requested with the given code.
    Terminate(i32),
}

/// Host that records recovery actions instead of performing them.
///
/// Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct RecordingHost {
    actions: Mutex<Vec<HostAction>>,
    fail_relaunch: bool,
}

impl RecordingHost {
    /// Create a new recording host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every relaunch attempt fail.
    pub fn with_failing_relaunch(mut self) -> Self {
        self.fail_relaunch = true;
        self
    }

    /// All recorded actions, in order.
    pub fn actions(&self) -> Vec<HostAction> {
        self.actions.lock().clone()
    }

    /// Number of relaunch requests.
    pub fn relaunches(&self) -> usize {
        self.count(|a| matches!(a, HostAction::Relaunch))
    }

    /// Number of termination requests.
    pub fn terminations(&self) -> usize {
        self.count(|a| matches!(a, HostAction::Terminate(_)))
    }

    fn count(&self, pred: impl Fn(&HostAction) -> bool) -> usize {
        self.actions.lock().iter().filter(|a| pred(a)).count()
    }
}

impl ProcessHost for RecordingHost {
    fn relaunch(&self) -> CoreResult<()> {
        self.actions.lock().push(HostAction::Relaunch);
        if self.fail_relaunch {
            return Err(CoreError::Relaunch(std::io::Error::other(
                "relaunch disabled",
            )));
        }
        Ok(())
    }

    fn terminate(&self, exit_code: i32) {
        self.actions.lock().push(HostAction::Terminate(exit_code));
    }
}
