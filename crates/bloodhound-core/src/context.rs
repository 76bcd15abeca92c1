//! Primary execution contexts.
//!
//! A primary context is the single-threaded task queue whose responsiveness
//! is being watched, typically the application's main loop. The watchdog
//! never inspects it directly: it only posts small fire-and-forget tasks
//! onto the queue and observes whether they run.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use crate::error::{ContextError, ContextResult};

/// A unit of work posted onto a primary context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A single-threaded task queue that can accept posted callbacks.
pub trait PrimaryContext: Send + Sync {
    /// Identity of the context, used in logs and reports.
    fn name(&self) -> &str;

    /// Enqueue a task without waiting for it to run.
    ///
    /// Implementations must never block on the queue being drained.
    fn post(&self, task: Task) -> ContextResult<()>;
}

/// Shared handle to a primary context.
pub type SharedContext = Arc<dyn PrimaryContext>;

/// Convert a primary context into a shared handle.
pub trait IntoSharedContext {
    /// Wrap `self` in an `Arc<dyn PrimaryContext>`.
    fn into_shared(self) -> SharedContext;
}

impl<C: PrimaryContext + 'static> IntoSharedContext for C {
    fn into_shared(self) -> SharedContext {
        Arc::new(self)
    }
}

enum Message {
    Run(Task),
    Shutdown,
}

/// Posting side of a channel-backed main loop.
///
/// Created together with a [`MainLoop`] by [`MainQueue::new`]. The queue can
/// be cloned freely; the loop drains tasks on whichever thread runs it.
#[derive(Clone)]
pub struct MainQueue {
    name: Arc<str>,
    sender: Sender<Message>,
}

impl MainQueue {
    /// Create a queue and the loop that drains it.
    pub fn new(name: impl Into<String>) -> (MainQueue, MainLoop) {
        let name: Arc<str> = Arc::from(name.into());
        let (sender, receiver) = mpsc::channel();
        let queue = MainQueue {
            name: Arc::clone(&name),
            sender,
        };
        let main_loop = MainLoop {
            name,
            receiver,
            processed: 0,
        };
        (queue, main_loop)
    }

    /// Create a queue whose loop runs on a dedicated, named thread.
    pub fn spawn(name: impl Into<String>) -> ContextResult<(MainQueue, JoinHandle<u64>)> {
        let (queue, main_loop) = Self::new(name);
        let handle = thread::Builder::new()
            .name(queue.name.to_string())
            .spawn(move || main_loop.run())
            .map_err(|e| ContextError::ThreadSpawnFailed(e.to_string()))?;
        Ok((queue, handle))
    }

    /// Ask the loop to exit once it reaches this message.
    pub fn shutdown(&self) {
        // A closed loop has already exited.
        let _ = self.sender.send(Message::Shutdown);
    }
}

impl PrimaryContext for MainQueue {
    fn name(&self) -> &str {
        &self.name
    }

    fn post(&self, task: Task) -> ContextResult<()> {
        self.sender
            .send(Message::Run(task))
            .map_err(|_| ContextError::Closed {
                name: self.name.to_string(),
            })
    }
}

impl std::fmt::Debug for MainQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainQueue").field("name", &self.name).finish()
    }
}

/// Draining side of a [`MainQueue`].
pub struct MainLoop {
    name: Arc<str>,
    receiver: Receiver<Message>,
    processed: u64,
}

impl MainLoop {
    /// Run tasks on the current thread until shutdown or until every queue
    /// handle has been dropped. Returns the number of tasks executed.
    pub fn run(mut self) -> u64 {
        info!(context = %self.name, "Main loop started");

        while let Ok(message) = self.receiver.recv() {
            match message {
                Message::Run(task) => {
                    task();
                    self.processed += 1;
                }
                Message::Shutdown => break,
            }
        }

        info!(
            context = %self.name,
            processed = self.processed,
            "Main loop stopped"
        );
        self.processed
    }

    /// Run every task that is already queued, without blocking.
    ///
    /// Useful for hosts that drive their own event loop and want to pump
    /// posted tasks once per frame.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(Message::Run(task)) => {
                    task();
                    ran += 1;
                }
                Ok(Message::Shutdown) | Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!(context = %self.name, "All queue handles dropped");
                    break;
                }
            }
        }
        self.processed += ran as u64;
        ran
    }

    /// Total number of tasks this loop has executed.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Name of the loop.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Primary context backed by a Tokio runtime handle.
///
/// Probes are spawned as tasks; on a current-thread runtime they only run
/// when the runtime's thread is free to poll them.
#[cfg(feature = "async")]
#[derive(Debug, Clone)]
pub struct TokioContext {
    name: String,
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "async")]
impl TokioContext {
    /// Wrap an existing runtime handle.
    pub fn new(name: impl Into<String>, handle: tokio::runtime::Handle) -> Self {
        Self {
            name: name.into(),
            handle,
        }
    }

    /// Wrap the runtime the caller is currently running on.
    pub fn current(name: impl Into<String>) -> Option<Self> {
        tokio::runtime::Handle::try_current()
            .ok()
            .map(|handle| Self::new(name, handle))
    }
}

#[cfg(feature = "async")]
impl PrimaryContext for TokioContext {
    fn name(&self) -> &str {
        &self.name
    }

    fn post(&self, task: Task) -> ContextResult<()> {
        drop(self.handle.spawn(async move { task() }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_run_pending_executes_in_order() {
        let (queue, mut main_loop) = MainQueue::new("main");
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = Arc::clone(&order);
            queue.post(Box::new(move || order.lock().push(i))).unwrap();
        }

        assert_eq!(main_loop.run_pending(), 3);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
        assert_eq!(main_loop.processed(), 3);
    }

    #[test]
    fn test_post_after_loop_dropped() {
        let (queue, main_loop) = MainQueue::new("main");
        drop(main_loop);

        let result = queue.post(Box::new(|| {}));
        assert!(matches!(result, Err(ContextError::Closed { .. })));
    }

    #[test]
    fn test_spawned_loop_shutdown() {
        let (queue, handle) = MainQueue::spawn("spawned-main").unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let counter = Arc::clone(&counter);
            queue
                .post(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
        }
        queue.shutdown();

        assert_eq!(handle.join().unwrap(), 5);
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_into_shared_keeps_name() {
        let (queue, _main_loop) = MainQueue::new("ui");
        let shared = queue.into_shared();
        assert_eq!(shared.name(), "ui");
    }

    #[cfg(feature = "async")]
    #[test]
    fn test_tokio_context_runs_posted_tasks() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .build()
            .unwrap();
        let context = TokioContext::new("async-main", runtime.handle().clone());
        let (tx, rx) = std::sync::mpsc::channel();

        context
            .post(Box::new(move || {
                let _ = tx.send(42);
            }))
            .unwrap();

        assert_eq!(rx.recv_timeout(std::time::Duration::from_secs(5)), Ok(42));
        assert_eq!(context.name(), "async-main");
        assert!(TokioContext::current("outside").is_none());
    }
}
