//! Lifecycle-driven monitoring.
//!
//! Hosts with several UI surfaces (screens, windows, views) feed their
//! lifecycle notifications into a [`LifecycleMonitor`]. Each notification
//! makes sure the session is running and keeps the reported foreground
//! identity current. A notification never resets a running session.

use std::sync::Arc;

use tracing::debug;

use crate::error::MonitorResult;
use crate::session::MonitorSession;

/// A lifecycle notification for a named surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The surface was created.
    Created(String),
    /// The surface became visible.
    Started(String),
    /// The surface gained focus.
    Resumed(String),
    /// The surface lost focus.
    Paused(String),
    /// The surface is no longer visible.
    Stopped(String),
    /// The surface is saving its state.
    SaveState(String),
    /// The surface was destroyed.
    Destroyed(String),
}

impl LifecycleEvent {
    /// Name of the surface the event is about.
    pub fn surface(&self) -> &str {
        match self {
            Self::Created(name)
            | Self::Started(name)
            | Self::Resumed(name)
            | Self::Paused(name)
            | Self::Stopped(name)
            | Self::SaveState(name)
            | Self::Destroyed(name) => name,
        }
    }

    /// Whether the surface becomes the foreground identity.
    pub fn is_foreground(&self) -> bool {
        matches!(self, Self::Created(_) | Self::Started(_) | Self::Resumed(_))
    }
}

/// Keeps a session running and its foreground identity current.
#[derive(Debug, Clone)]
pub struct LifecycleMonitor {
    session: Arc<MonitorSession>,
}

impl LifecycleMonitor {
    /// Create a monitor driving `session`.
    pub fn new(session: Arc<MonitorSession>) -> Self {
        Self { session }
    }

    /// The driven session.
    pub fn session(&self) -> &Arc<MonitorSession> {
        &self.session
    }

    /// Handle one lifecycle notification.
    pub fn on_event(&self, event: LifecycleEvent) -> MonitorResult<()> {
        debug!(event = ?event, "Lifecycle event");

        if event.is_foreground() {
            self.session.set_primary_name(event.surface());
        } else if let LifecycleEvent::Destroyed(surface) = &event {
            if self.session.primary_name().as_deref() == Some(surface.as_str()) {
                self.session.set_primary_name(bloodhound_observe::UNKNOWN);
            }
        }

        self.session.start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use bloodhound_core::{MainQueue, ProcessHost, RecordingHost};

    fn monitor() -> (LifecycleMonitor, MainQueue, std::thread::JoinHandle<u64>) {
        let (queue, main) = MainQueue::spawn("main").unwrap();
        let config = MonitorConfig::new(queue.clone(), "lifecycle")
            .with_host(Arc::new(RecordingHost::new()) as Arc<dyn ProcessHost>)
            .with_capture_panics(false);
        let session = Arc::new(MonitorSession::new(config).unwrap());
        (LifecycleMonitor::new(session), queue, main)
    }

    #[test]
    fn test_event_surface() {
        let event = LifecycleEvent::SaveState("Settings".to_string());
        assert_eq!(event.surface(), "Settings");
        assert!(!event.is_foreground());
        assert!(LifecycleEvent::Resumed("Home".to_string()).is_foreground());
    }

    #[test]
    fn test_foreground_events_update_identity() {
        let (monitor, queue, main) = monitor();

        monitor
            .on_event(LifecycleEvent::Created("Home".to_string()))
            .unwrap();
        assert!(monitor.session().is_running());
        assert_eq!(monitor.session().primary_name().as_deref(), Some("Home"));

        monitor
            .on_event(LifecycleEvent::Resumed("Settings".to_string()))
            .unwrap();
        monitor
            .on_event(LifecycleEvent::Paused("Settings".to_string()))
            .unwrap();
        assert_eq!(monitor.session().primary_name().as_deref(), Some("Settings"));

        // Repeated events never restart the session
        assert_eq!(monitor.session().stats().starts, 1);

        monitor.session().stop();
        queue.shutdown();
        let _ = main.join();
    }

    #[test]
    fn test_destroyed_clears_current_identity() {
        let (monitor, queue, main) = monitor();

        monitor
            .on_event(LifecycleEvent::Resumed("Home".to_string()))
            .unwrap();
        monitor
            .on_event(LifecycleEvent::Destroyed("Other".to_string()))
            .unwrap();
        assert_eq!(monitor.session().primary_name().as_deref(), Some("Home"));

        monitor
            .on_event(LifecycleEvent::Destroyed("Home".to_string()))
            .unwrap();
        assert_eq!(
            monitor.session().primary_name().as_deref(),
            Some(bloodhound_observe::UNKNOWN)
        );

        monitor.session().stop();
        queue.shutdown();
        let _ = main.join();
    }
}
