//! Process-wide panic hook ownership.

use std::panic::{self, PanicHookInfo};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use parking_lot::{Mutex, const_mutex};
use tracing::{debug, warn};

use crate::error::{InterceptError, InterceptResult};
use crate::interceptor::FaultInterceptor;

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Hook a guard could not restore because it was dropped mid-panic.
/// The next guard to install adopts it as its previous hook.
static STRANDED_HOOK: Mutex<Option<PanicHook>> = const_mutex(None);

/// Routes panics to a [`FaultInterceptor`] for as long as it is alive.
///
/// Only one guard may exist per process. Dropping the guard restores the
/// hook that was active before installation.
///
/// A guard dropped while its thread is panicking cannot touch the process
/// hook. Ownership is released anyway and the interceptor's hook stays
/// active until the next guard installs; that guard restores the original
/// hook when it goes.
pub struct PanicHookGuard {
    previous: Option<PanicHook>,
}

impl PanicHookGuard {
    /// Replace the process panic hook with one feeding `interceptor`.
    pub fn install(interceptor: Arc<FaultInterceptor>) -> InterceptResult<Self> {
        if thread::panicking() {
            return Err(InterceptError::Panicking);
        }
        if HOOK_INSTALLED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(InterceptError::HookAlreadyInstalled);
        }

        let current = panic::take_hook();
        let previous = match STRANDED_HOOK.lock().take() {
            // `current` is the hook of a guard that was dropped mid-panic.
            Some(stranded) => stranded,
            None => current,
        };
        panic::set_hook(Box::new(move |info| interceptor.handle_panic(info)));
        debug!("Panic hook installed");

        Ok(Self {
            previous: Some(previous),
        })
    }

    /// Whether any guard currently owns the panic hook.
    pub fn is_installed() -> bool {
        HOOK_INSTALLED.load(Ordering::SeqCst)
    }

    /// Restore the previous hook now.
    pub fn uninstall(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        let Some(previous) = self.previous.take() else {
            return;
        };

        if thread::panicking() {
            // set_hook panics on a panicking thread; the interceptor stays installed
            *STRANDED_HOOK.lock() = Some(previous);
            HOOK_INSTALLED.store(false, Ordering::SeqCst);
            warn!("Cannot restore panic hook while panicking; deferred to the next install");
            return;
        }

        panic::set_hook(previous);
        HOOK_INSTALLED.store(false, Ordering::SeqCst);
        debug!("Panic hook restored");
    }
}

impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        self.restore();
    }
}

impl std::fmt::Debug for PanicHookGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanicHookGuard")
            .field("active", &self.previous.is_some())
            .finish()
    }
}
