//! Cooperative shutdown coordination
//!
//! A [`ShutdownController`] owns the process-wide stop flag and tracks task
//! completion. Each spawned task holds a [`ShutdownHandle`]; the handle's
//! existence registers the task, dropping it deregisters. [`ShutdownController::shutdown`]
//! raises the stop flag and then blocks until every handle has been dropped,
//! so it cannot return while the acceptor or any connection task is still
//! running.
//!
//! The stop flag is a shared atomic: any number of tasks may test it, any
//! number of times, without consuming it. No task is ever force-terminated;
//! exit latency is bounded by each task's poll interval.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Per-task view of the shutdown state
///
/// Cloning registers another task with the controller. The clone must be
/// dropped when that task exits or `shutdown()` will wait forever.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    stop: Arc<AtomicBool>,
    // Completion is tracked by sender count alone; nothing is ever sent.
    _registration: mpsc::Sender<()>,
}

impl ShutdownHandle {
    /// Non-blocking, non-consuming test of the stop flag
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}

/// Process-wide stop signal plus completion tracking
#[derive(Debug)]
pub struct ShutdownController {
    stop: Arc<AtomicBool>,
    registration: mpsc::Sender<()>,
    completions: mpsc::Receiver<()>,
}

impl ShutdownController {
    /// Create a controller with no registered tasks
    #[must_use]
    pub fn new() -> Self {
        let (registration, completions) = mpsc::channel(1);
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            registration,
            completions,
        }
    }

    /// Register a task, returning its handle
    ///
    /// Registration is dynamic: connections arrive unpredictably, and a task
    /// may register further tasks by cloning its own handle.
    #[must_use]
    pub fn register(&self) -> ShutdownHandle {
        ShutdownHandle {
            stop: Arc::clone(&self.stop),
            _registration: self.registration.clone(),
        }
    }

    /// Whether a stop has been requested
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Raise the stop flag and wait for every registered task to exit
    ///
    /// The flag is broadcast-once and idempotent to observe; tasks notice it
    /// at their next poll checkpoint, so the wait is bounded by the longest
    /// poll interval rather than the number of tasks.
    pub async fn shutdown(mut self) {
        self.stop.store(true, Ordering::Release);
        // Drop our own sender so the channel closes once all handles are gone.
        drop(self.registration);
        while self.completions.recv().await.is_some() {}
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
