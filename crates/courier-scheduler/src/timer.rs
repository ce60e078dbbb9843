//! Timer engine: one-shot callbacks at absolute instants.
//!
//! [`TokioTimerEngine`] runs every timer as its own tokio task, so a slow
//! delivery never holds up other timers. Each timer races its sleep against a
//! [`CancellationToken`]; once the sleep has won, the callback runs to
//! completion and cancelling the handle has no effect on it.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::TimerError;

/// Identifies one scheduled timer. A message that is re-postponed gets a new
/// job id, which lets a stale timer recognise that it has been superseded.
pub type JobId = Uuid;

/// Callback run when a timer fires. Receives the id of the firing job.
pub type TimerTask = Box<dyn FnOnce(JobId) -> BoxFuture<'static, ()> + Send>;

/// Handle to a pending timer, usable for cancellation.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: JobId,
    due_at: DateTime<Utc>,
    token: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl TimerHandle {
    /// Create a handle for a timer due at `due_at`.
    pub fn new(due_at: DateTime<Utc>, token: CancellationToken) -> Self {
        Self {
            id: Uuid::new_v4(),
            due_at,
            token,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the job ID.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Instant the timer was scheduled for.
    pub fn due_at(&self) -> DateTime<Utc> {
        self.due_at
    }

    /// Check if the timer was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Check if the timer has started running its callback.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    fn mark_fired(&self) {
        self.fired.store(true, Ordering::SeqCst);
    }
}

/// Schedules callbacks at absolute instants.
pub trait TimerEngine: Send + Sync {
    /// Run `task` at `at`. An instant that is not in the future fires as
    /// soon as possible.
    fn schedule(&self, at: DateTime<Utc>, task: TimerTask) -> Result<TimerHandle, TimerError>;

    /// Prevent a not-yet-fired timer from firing. Has no effect on a
    /// callback that is already running.
    fn cancel(&self, handle: &TimerHandle);

    /// Number of timers waiting to fire.
    fn pending(&self) -> usize;

    /// Cancel every pending timer and refuse new ones.
    fn shutdown(&self);
}

/// Default engine backed by `tokio::time`.
pub struct TokioTimerEngine {
    root: CancellationToken,
    pending: Arc<AtomicUsize>,
    max_pending: usize,
}

impl TokioTimerEngine {
    /// Create an engine that accepts at most `max_pending` concurrent timers.
    pub fn new(max_pending: usize) -> Self {
        Self {
            root: CancellationToken::new(),
            pending: Arc::new(AtomicUsize::new(0)),
            max_pending,
        }
    }

    /// Check if the engine was shut down.
    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }

    fn reserve_slot(&self) -> Result<PendingGuard, TimerError> {
        let max = self.max_pending;
        self.pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < max).then_some(n + 1))
            .map_err(TimerError::CapacityExceeded)?;
        Ok(PendingGuard(self.pending.clone()))
    }
}

impl Default for TokioTimerEngine {
    fn default() -> Self {
        Self::new(100_000)
    }
}

impl Drop for TokioTimerEngine {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

impl TimerEngine for TokioTimerEngine {
    fn schedule(&self, at: DateTime<Utc>, task: TimerTask) -> Result<TimerHandle, TimerError> {
        if self.is_shut_down() {
            return Err(TimerError::ShutDown);
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TimerError::NoRuntime(e.to_string()))?;
        let slot = self.reserve_slot()?;

        let delay = (at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        let handle = TimerHandle::new(at, self.root.child_token());
        let timer = handle.clone();

        runtime.spawn(async move {
            let fire = {
                let _slot = slot;
                tokio::select! {
                    biased;
                    _ = timer.token.cancelled() => false,
                    _ = tokio::time::sleep(delay) => true,
                }
            };

            if fire {
                timer.mark_fired();
                task(timer.id).await;
            } else {
                debug!("Timer {} cancelled before firing", timer.id);
            }
        });

        debug!("Timer {} scheduled for {} (in {:?})", handle.id, at.to_rfc3339(), delay);
        Ok(handle)
    }

    fn cancel(&self, handle: &TimerHandle) {
        handle.token.cancel();
    }

    fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    fn shutdown(&self) {
        info!("Timer engine shutting down with {} pending timer(s)", self.pending());
        self.root.cancel();
    }
}

/// Releases a pending slot when the timer task finishes or is dropped.
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
