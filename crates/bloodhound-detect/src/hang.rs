//! Heartbeat-based hang detection.
//!
//! The detector cannot look inside the primary context. Instead a background
//! thread posts a probe onto the context's queue every period; each probe
//! that runs resets the idle counter. A context that keeps draining its
//! queue, however busy, resets the counter every period. Only a context that
//! stops draining entirely lets the counter reach the threshold.
//!
//! This detects starvation, not slowness: a context that is late but still
//! drains within the threshold is never reported.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, info, warn};

use bloodhound_core::{MonitorSettings, SharedContext};
use crate::error::{DetectError, DetectResult};

/// Configuration for hang detection.
#[derive(Debug, Clone)]
pub struct HangConfig {
    /// Period between probes.
    ///
    /// Also bounds how quickly a stop request is honored.
    pub probe_interval: Duration,
    /// Idle time after which the context counts as hung.
    pub threshold: Duration,
    /// Stop probing once a hang has been signalled.
    ///
    /// When false the detector keeps probing but never signals again until
    /// it is restarted.
    pub stop_on_hang: bool,
}

impl Default for HangConfig {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_millis(200),
            threshold: Duration::from_millis(3000),
            stop_on_hang: true,
        }
    }
}

impl HangConfig {
    /// Create a new hang configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the probe interval.
    pub fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    /// Set the hang threshold.
    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    /// Configure whether probing stops after a hang.
    pub fn with_stop_on_hang(mut self, stop: bool) -> Self {
        self.stop_on_hang = stop;
        self
    }

    /// Tight limits for latency-sensitive loops.
    pub fn strict() -> Self {
        Self {
            probe_interval: Duration::from_millis(100),
            threshold: Duration::from_millis(1000),
            stop_on_hang: true,
        }
    }

    /// Loose limits for loops that legitimately block for a while.
    pub fn relaxed() -> Self {
        Self {
            probe_interval: Duration::from_millis(500),
            threshold: Duration::from_secs(10),
            stop_on_hang: true,
        }
    }

    /// Number of unanswered probe periods that make up the threshold.
    pub fn periods_to_threshold(&self) -> u64 {
        let periods = self.threshold.as_nanos() / self.probe_interval.as_nanos().max(1);
        periods.max(1) as u64
    }

    /// Check the configuration.
    pub fn validate(&self) -> DetectResult<()> {
        if self.probe_interval.is_zero() {
            return Err(DetectError::InvalidConfig(
                "probe interval must be greater than zero".to_string(),
            ));
        }
        // A probe drained during the sleep still leaves one full period on
        // the counter at the next check.
        if self.threshold <= self.probe_interval {
            return Err(DetectError::InvalidConfig(format!(
                "threshold {:?} must be greater than the probe interval {:?}",
                self.threshold, self.probe_interval
            )));
        }
        Ok(())
    }
}

impl From<&MonitorSettings> for HangConfig {
    fn from(settings: &MonitorSettings) -> Self {
        Self {
            probe_interval: settings.probe_interval(),
            threshold: settings.threshold(),
            stop_on_hang: settings.stop_on_hang,
        }
    }
}

/// A detected hang.
#[derive(Debug, Clone)]
pub struct HangEvent {
    /// Name of the unresponsive context.
    pub context: String,
    /// Idle time accumulated when the hang was signalled.
    pub idle: Duration,
    /// Configured threshold.
    pub threshold: Duration,
}

/// Callback invoked when a hang is detected.
pub type HangCallback = Arc<dyn Fn(HangEvent) + Send + Sync>;

/// Counters shared between the detector thread and posted probes.
#[derive(Debug, Default)]
struct ProbeState {
    elapsed_nanos: AtomicU64,
    pending_probe: AtomicBool,
    probes_sent: AtomicU64,
    probes_acknowledged: AtomicU64,
    max_idle_nanos: AtomicU64,
    hangs_detected: AtomicU64,
}

impl ProbeState {
    /// Runs on the primary context.
    fn acknowledge(&self) {
        self.elapsed_nanos.store(0, Ordering::SeqCst);
        self.pending_probe.store(false, Ordering::SeqCst);
        self.probes_acknowledged.fetch_add(1, Ordering::Relaxed);
    }
}

/// Cancellation signal for one detector run.
#[derive(Default)]
struct Shutdown {
    stopped: Mutex<bool>,
    signal: Condvar,
}

impl Shutdown {
    fn trigger(&self) {
        *self.stopped.lock() = true;
        self.signal.notify_all();
    }

    fn is_triggered(&self) -> bool {
        *self.stopped.lock()
    }

    /// Sleep for `timeout` unless triggered first. Returns whether triggered.
    fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.signal.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }
}

struct ActiveRun {
    shutdown: Arc<Shutdown>,
    handle: JoinHandle<()>,
}

/// A probe thread that has been told to stop but not yet joined.
///
/// Returned by [`HangDetector::request_stop`] so callers can release their
/// own locks before waiting on the thread.
#[must_use = "the probe thread is only joined by `wait`"]
pub struct PendingStop {
    handle: JoinHandle<()>,
}

impl PendingStop {
    /// Join the probe thread.
    ///
    /// Returns immediately when called from the probe thread itself, e.g.
    /// from the hang callback; the thread then finishes on its own.
    pub fn wait(self) {
        if self.handle.thread().id() == thread::current().id() {
            return;
        }
        if let Err(e) = self.handle.join() {
            warn!("Failed to join hang detector thread: {:?}", e);
        }
    }
}

impl std::fmt::Debug for PendingStop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingStop")
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}

fn saturating_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Watches a primary context for hangs.
///
/// `HangDetector` runs a background thread that round-trips probes through
/// the context's queue and invokes the hang callback at most once per run.
///
/// # Example
///
/// ```ignore
/// use bloodhound_detect::{HangConfig, HangDetector};
///
/// let detector = HangDetector::new(queue.into_shared(), HangConfig::default(), |event| {
///     eprintln!("{} is not responding", event.context);
/// })?;
/// detector.start()?;
/// ```
pub struct HangDetector {
    context: SharedContext,
    config: HangConfig,
    on_hang: HangCallback,
    state: RwLock<Arc<ProbeState>>,
    run: Mutex<Option<ActiveRun>>,
    running: AtomicBool,
    loops_started: AtomicU64,
}

impl HangDetector {
    /// Create a stopped detector.
    pub fn new<F>(context: SharedContext, config: HangConfig, on_hang: F) -> DetectResult<Self>
    where
        F: Fn(HangEvent) + Send + Sync + 'static,
    {
        config.validate()?;

        Ok(Self {
            context,
            config,
            on_hang: Arc::new(on_hang),
            state: RwLock::new(Arc::new(ProbeState::default())),
            run: Mutex::new(None),
            running: AtomicBool::new(false),
            loops_started: AtomicU64::new(0),
        })
    }

    /// Start the detector thread with fresh counters.
    ///
    /// Does nothing if the detector is already running.
    pub fn start(&self) -> DetectResult<()> {
        // Held for the whole transition so a concurrent stop sees either no
        // run or a fully spawned one.
        let mut run = self.run.lock();
        if run.is_some() {
            return Ok(()); // Already running
        }

        let state = Arc::new(ProbeState::default());
        *self.state.write() = Arc::clone(&state);

        let shutdown = Arc::new(Shutdown::default());
        let context = Arc::clone(&self.context);
        let config = self.config.clone();
        let on_hang = Arc::clone(&self.on_hang);
        let thread_shutdown = Arc::clone(&shutdown);

        let spawned = thread::Builder::new()
            .name("bloodhound-hang-detector".to_string())
            .spawn(move || probe_loop(context, config, state, thread_shutdown, on_hang));

        let handle = spawned.map_err(|e| DetectError::ThreadSpawnFailed(e.to_string()))?;

        *run = Some(ActiveRun { shutdown, handle });
        self.running.store(true, Ordering::SeqCst);
        self.loops_started.fetch_add(1, Ordering::Relaxed);

        info!(
            context = self.context.name(),
            probe_interval_ms = self.config.probe_interval.as_millis(),
            threshold_ms = self.config.threshold.as_millis(),
            "Started hang detector"
        );

        Ok(())
    }

    /// Stop the detector thread and wait for it.
    ///
    /// Safe to call from the hang callback itself; the thread is then left
    /// to finish on its own instead of being joined.
    pub fn stop(&self) {
        if let Some(pending) = self.request_stop() {
            pending.wait();
        }
    }

    /// Signal the detector thread to stop without joining it.
    ///
    /// Returns `None` if the detector was not running. Once this returns the
    /// detector counts as stopped and [`start`](Self::start) spawns a fresh
    /// thread; the old one never signals a hang after being told to stop.
    pub fn request_stop(&self) -> Option<PendingStop> {
        let active = {
            let mut run = self.run.lock();
            let active = run.take()?;
            self.running.store(false, Ordering::SeqCst);
            active.shutdown.trigger();
            active
        };

        info!(context = self.context.name(), "Stopped hang detector");
        Some(PendingStop {
            handle: active.handle,
        })
    }

    /// Whether the detector has been started and not stopped.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Whether the probe thread is still looping.
    ///
    /// Becomes false after a hang when `stop_on_hang` is set, or when the
    /// primary context goes away.
    pub fn is_probing(&self) -> bool {
        self.run
            .lock()
            .as_ref()
            .is_some_and(|run| !run.handle.is_finished())
    }

    /// The detector configuration.
    pub fn config(&self) -> &HangConfig {
        &self.config
    }

    /// Name of the watched context.
    pub fn context_name(&self) -> &str {
        self.context.name()
    }

    /// Current idle time of the primary context, as seen by the detector.
    pub fn idle(&self) -> Duration {
        Duration::from_nanos(self.state.read().elapsed_nanos.load(Ordering::SeqCst))
    }

    /// Number of probe threads spawned over the detector's lifetime.
    pub fn loops_started(&self) -> u64 {
        self.loops_started.load(Ordering::Relaxed)
    }

    /// Get a snapshot of detector statistics for the current run.
    pub fn stats(&self) -> HangStats {
        let state = Arc::clone(&self.state.read());
        HangStats {
            probes_sent: state.probes_sent.load(Ordering::Relaxed),
            probes_acknowledged: state.probes_acknowledged.load(Ordering::Relaxed),
            max_idle: Duration::from_nanos(state.max_idle_nanos.load(Ordering::Relaxed)),
            hangs_detected: state.hangs_detected.load(Ordering::Relaxed),
            is_running: self.is_running(),
            probe_interval: self.config.probe_interval,
            threshold: self.config.threshold,
        }
    }
}

impl Drop for HangDetector {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for HangDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HangDetector")
            .field("context", &self.context.name())
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish()
    }
}

fn probe_loop(
    context: SharedContext,
    config: HangConfig,
    state: Arc<ProbeState>,
    shutdown: Arc<Shutdown>,
    on_hang: HangCallback,
) {
    let period = saturating_nanos(config.probe_interval);
    let threshold = saturating_nanos(config.threshold);
    let mut signalled = false;

    debug!(context = context.name(), "Hang detector thread started");

    while !shutdown.is_triggered() {
        let elapsed = state
            .elapsed_nanos
            .fetch_add(period, Ordering::SeqCst)
            .saturating_add(period);
        state.max_idle_nanos.fetch_max(elapsed, Ordering::Relaxed);

        let probe_state = Arc::clone(&state);
        if let Err(e) = context.post(Box::new(move || probe_state.acknowledge())) {
            // Without a queue to probe there is nothing left to detect.
            info!(error = %e, "Primary context closed; hang detection stopped");
            break;
        }
        state.probes_sent.fetch_add(1, Ordering::Relaxed);

        // `pending_probe` is only still set if the probe posted one period
        // ago has not run.
        if !signalled && elapsed >= threshold && state.pending_probe.load(Ordering::SeqCst) {
            if shutdown.is_triggered() {
                break;
            }
            signalled = true;
            state.hangs_detected.fetch_add(1, Ordering::Relaxed);

            let idle = Duration::from_nanos(elapsed);
            warn!(
                context = context.name(),
                idle_ms = idle.as_millis(),
                threshold_ms = config.threshold.as_millis(),
                "Primary context is not responding"
            );
            on_hang(HangEvent {
                context: context.name().to_string(),
                idle,
                threshold: config.threshold,
            });

            if config.stop_on_hang {
                break;
            }
        }

        if shutdown.wait(config.probe_interval) {
            break;
        }

        // Arm detection for the next window.
        let _ = state
            .pending_probe
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst);
    }

    debug!(context = context.name(), "Hang detector thread stopped");
}

/// Statistics snapshot from a hang detector.
#[derive(Debug, Clone)]
pub struct HangStats {
    /// Probes posted in the current run.
    pub probes_sent: u64,
    /// Probes that ran on the primary context.
    pub probes_acknowledged: u64,
    /// Longest idle time observed.
    pub max_idle: Duration,
    /// Hangs signalled in the current run (0 or 1).
    pub hangs_detected: u64,
    /// Whether the detector is running.
    pub is_running: bool,
    /// Probe interval.
    pub probe_interval: Duration,
    /// Hang threshold.
    pub threshold: Duration,
}

impl HangStats {
    /// Probes that have not (yet) been answered.
    pub fn unanswered(&self) -> u64 {
        self.probes_sent.saturating_sub(self.probes_acknowledged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloodhound_core::{IntoSharedContext, MainQueue, PrimaryContext};
    use std::sync::mpsc;

    fn fast_config() -> HangConfig {
        HangConfig::new()
            .with_probe_interval(Duration::from_millis(10))
            .with_threshold(Duration::from_millis(100))
    }

    #[test]
    fn test_hang_config() {
        let config = HangConfig::new()
            .with_probe_interval(Duration::from_millis(50))
            .with_threshold(Duration::from_secs(2));

        assert_eq!(config.periods_to_threshold(), 40);
        assert!(config.validate().is_ok());
        assert!(HangConfig::strict().threshold < HangConfig::relaxed().threshold);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (queue, _main_loop) = MainQueue::new("main");
        let config = HangConfig::new().with_probe_interval(Duration::ZERO);
        assert!(HangDetector::new(queue.into_shared(), config, |_| {}).is_err());
    }

    #[test]
    fn test_threshold_must_exceed_probe_interval() {
        let (queue, _main_loop) = MainQueue::new("main");
        let config = HangConfig::new()
            .with_probe_interval(Duration::from_millis(50))
            .with_threshold(Duration::from_millis(50));

        assert!(matches!(config.validate(), Err(DetectError::InvalidConfig(_))));
        assert!(HangDetector::new(queue.into_shared(), config, |_| {}).is_err());
    }

    #[test]
    fn test_config_from_settings() {
        let settings = MonitorSettings::new("app")
            .with_threshold(Duration::from_millis(1500))
            .with_stop_on_hang(false);
        let config = HangConfig::from(&settings);

        assert_eq!(config.threshold, Duration::from_millis(1500));
        assert_eq!(config.probe_interval, Duration::from_millis(200));
        assert!(!config.stop_on_hang);
    }

    #[test]
    fn test_responsive_context_never_hangs() {
        let (queue, handle) = MainQueue::spawn("responsive-main").unwrap();
        let (tx, rx) = mpsc::channel();
        let detector = HangDetector::new(queue.clone().into_shared(), fast_config(), move |e| {
            let _ = tx.send(e);
        })
        .unwrap();

        detector.start().unwrap();
        thread::sleep(Duration::from_millis(500));
        let stats = detector.stats();
        detector.stop();

        assert!(rx.try_recv().is_err());
        assert_eq!(stats.hangs_detected, 0);
        assert!(stats.probes_acknowledged > 0);
        assert!(stats.max_idle < Duration::from_millis(100));

        queue.shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn test_pumped_context_near_minimum_threshold_stays_quiet() {
        let (queue, mut main_loop) = MainQueue::new("pumped-main");
        let (tx, rx) = mpsc::channel();
        let config = HangConfig::new()
            .with_probe_interval(Duration::from_millis(20))
            .with_threshold(Duration::from_millis(60));
        let detector = HangDetector::new(queue.into_shared(), config, move |e| {
            let _ = tx.send(e);
        })
        .unwrap();

        detector.start().unwrap();
        let deadline = Instant::now() + Duration::from_millis(400);
        while Instant::now() < deadline {
            main_loop.run_pending();
            thread::sleep(Duration::from_millis(5));
        }
        let stats = detector.stats();
        detector.stop();

        assert!(rx.try_recv().is_err(), "responsive context reported as hung");
        assert_eq!(stats.hangs_detected, 0);
        assert!(stats.probes_acknowledged > 0);
    }

    #[test]
    fn test_sub_millisecond_interval_detects_hang() {
        let (queue, _main_loop) = MainQueue::new("stalled-main");
        let (tx, rx) = mpsc::channel();
        let config = HangConfig::new()
            .with_probe_interval(Duration::from_micros(500))
            .with_threshold(Duration::from_millis(5));
        let detector = HangDetector::new(queue.into_shared(), config, move |e| {
            let _ = tx.send(e);
        })
        .unwrap();

        detector.start().unwrap();
        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        detector.stop();

        assert!(event.idle >= Duration::from_millis(5));
        assert!(detector.stats().max_idle >= Duration::from_millis(5));
    }

    #[test]
    fn test_stalled_context_hangs_once_near_threshold() {
        // The loop is never driven, so no probe ever runs.
        let (queue, _main_loop) = MainQueue::new("stalled-main");
        let (tx, rx) = mpsc::channel();
        let config = fast_config().with_stop_on_hang(false);
        let detector = HangDetector::new(queue.into_shared(), config, move |e| {
            let _ = tx.send(e);
        })
        .unwrap();

        let started = Instant::now();
        detector.start().unwrap();

        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        let fired_after = started.elapsed();

        assert_eq!(event.context, "stalled-main");
        assert!(event.idle >= Duration::from_millis(100));
        assert!(fired_after >= Duration::from_millis(80), "fired after {fired_after:?}");
        assert!(fired_after < Duration::from_millis(1000), "fired after {fired_after:?}");

        // Still probing, but never signals twice.
        thread::sleep(Duration::from_millis(200));
        assert!(detector.is_probing());
        assert!(rx.try_recv().is_err());
        assert_eq!(detector.stats().hangs_detected, 1);

        detector.stop();
    }

    #[test]
    fn test_context_blocked_by_long_task() {
        let (queue, handle) = MainQueue::spawn("busy-main").unwrap();
        let (tx, rx) = mpsc::channel();
        let detector = HangDetector::new(queue.clone().into_shared(), fast_config(), move |e| {
            let _ = tx.send(e);
        })
        .unwrap();

        detector.start().unwrap();
        thread::sleep(Duration::from_millis(50));
        queue
            .post(Box::new(|| thread::sleep(Duration::from_millis(400))))
            .unwrap();

        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());

        // stop_on_hang ends the probe loop on its own.
        thread::sleep(Duration::from_millis(50));
        assert!(!detector.is_probing());
        detector.stop();

        queue.shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn test_stop_is_prompt() {
        let (queue, _main_loop) = MainQueue::new("main");
        let config = HangConfig::new()
            .with_probe_interval(Duration::from_secs(5))
            .with_threshold(Duration::from_secs(60));
        let detector = HangDetector::new(queue.into_shared(), config, |_| {}).unwrap();

        detector.start().unwrap();
        thread::sleep(Duration::from_millis(20));

        let stopping = Instant::now();
        detector.stop();
        assert!(stopping.elapsed() < Duration::from_secs(1));
        assert!(!detector.is_running());
    }

    #[test]
    fn test_closed_context_stops_quietly() {
        let (queue, main_loop) = MainQueue::new("gone");
        drop(main_loop);
        let (tx, rx) = mpsc::channel();
        let detector = HangDetector::new(queue.into_shared(), fast_config(), move |e| {
            let _ = tx.send(e);
        })
        .unwrap();

        detector.start().unwrap();
        thread::sleep(Duration::from_millis(300));

        assert!(rx.try_recv().is_err());
        assert!(!detector.is_probing());
        detector.stop();
    }

    #[test]
    fn test_start_is_idempotent_and_restart_resets() {
        let (queue, _main_loop) = MainQueue::new("stalled");
        let (tx, rx) = mpsc::channel();
        let detector = HangDetector::new(queue.into_shared(), fast_config(), move |e| {
            let _ = tx.send(e);
        })
        .unwrap();

        detector.start().unwrap();
        detector.start().unwrap();
        assert_eq!(detector.loops_started(), 1);

        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        detector.stop();

        detector.start().unwrap();
        assert_eq!(detector.loops_started(), 2);
        assert_eq!(detector.stats().hangs_detected, 0);
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        detector.stop();
    }

    #[test]
    fn test_concurrent_start_stop_leaves_no_thread_behind() {
        let (queue, handle) = MainQueue::spawn("contended-main").unwrap();
        let detector = Arc::new(
            HangDetector::new(queue.clone().into_shared(), fast_config(), |_| {}).unwrap(),
        );

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let detector = Arc::clone(&detector);
                thread::spawn(move || {
                    for i in 0..25 {
                        if i % 2 == 0 {
                            detector.start().unwrap();
                        } else {
                            detector.stop();
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        detector.stop();
        assert!(!detector.is_running());
        assert!(!detector.is_probing());

        queue.shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn test_request_stop_allows_restart_before_join() {
        let (queue, _main_loop) = MainQueue::new("stalled");
        let detector = HangDetector::new(queue.into_shared(), fast_config(), |_| {}).unwrap();

        assert!(detector.request_stop().is_none());

        detector.start().unwrap();
        let pending = detector.request_stop().unwrap();
        assert!(!detector.is_running());

        detector.start().unwrap();
        assert!(detector.is_running());
        assert_eq!(detector.loops_started(), 2);

        pending.wait();
        detector.stop();
        assert!(!detector.is_probing());
    }

    #[test]
    fn test_stop_from_hang_callback() {
        let (queue, _main_loop) = MainQueue::new("stalled");
        let slot: Arc<Mutex<Option<Arc<HangDetector>>>> = Arc::new(Mutex::new(None));
        let (tx, rx) = mpsc::channel();

        let callback_slot = Arc::clone(&slot);
        let detector = Arc::new(
            HangDetector::new(queue.into_shared(), fast_config(), move |_| {
                if let Some(detector) = callback_slot.lock().as_ref() {
                    detector.stop();
                }
                let _ = tx.send(());
            })
            .unwrap(),
        );
        *slot.lock() = Some(Arc::clone(&detector));

        detector.start().unwrap();
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        assert!(!detector.is_running());

        slot.lock().take();
    }
}
