//! Cooperative cancellation with a join barrier.
//!
//! A [`Stopper`] pairs a stop signal with the set of workers that must finish
//! before [`Stopper::stop`] returns. The server owns two of them (connections
//! first, hub second) and the hub creates one per backpressured client.

use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tokio_util::task::TaskTracker;
use tokio_util::task::task_tracker::TaskTrackerToken;

/// Guard for a worker registered with a [`Stopper`].
///
/// The worker counts as outstanding until the guard is dropped.
pub type WorkerGuard = TaskTrackerToken;

/// Stop signal plus join barrier.
///
/// Cloning yields another handle to the same signal and barrier. Once
/// stopped, a stopper stays stopped.
#[derive(Debug, Clone, Default)]
pub struct Stopper {
    token: CancellationToken,
    tracker: TaskTracker,
}

impl Stopper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a worker that is joined by [`Stopper::stop`].
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(task)
    }

    /// Register a worker that is not spawned through this stopper.
    pub fn register(&self) -> WorkerGuard {
        self.tracker.token()
    }

    /// A clone of the stop signal, for `select!` arms and child tokens.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the stop signal fires.
    pub fn stopped(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Number of registered workers that have not finished yet.
    pub fn active(&self) -> usize {
        self.tracker.len()
    }

    /// Signal stop, then wait for every registered worker to finish.
    ///
    /// Safe to call any number of times.
    pub async fn stop(&self) {
        self.token.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}
