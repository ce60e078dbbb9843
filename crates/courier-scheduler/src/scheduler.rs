//! The scheduler: schedule and cancel deferred deliveries.
//!
//! Fire-time delivery lives in `delivery`, startup recovery in `recovery`
//! and bulk cancellation in `cascade`; all of them hang off [`Scheduler`].

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tracing::{debug, error, info};

use courier_protocols::{ApplicationDirectory, MessageId, MessageStore, Notifier};

use crate::error::{ScheduleError, ScheduleResult};
use crate::registry::JobRegistry;
use crate::stats::{SchedulerStats, SchedulerStatsSnapshot};
use crate::timer::{JobId, TimerEngine, TimerTask, TokioTimerEngine};

/// Schedules postponed messages and delivers them when they come due.
///
/// Cheap to clone; clones share the same job table.
#[derive(Clone)]
pub struct Scheduler {
    pub(crate) inner: Arc<SchedulerInner>,
}

pub(crate) struct SchedulerInner {
    pub(crate) registry: JobRegistry,
    pub(crate) engine: Arc<dyn TimerEngine>,
    pub(crate) store: Arc<dyn MessageStore>,
    pub(crate) directory: Arc<dyn ApplicationDirectory>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) stats: SchedulerStats,
    pub(crate) recovered: AtomicBool,
}

impl Scheduler {
    /// Create a scheduler driven by `engine`.
    pub fn new(
        store: Arc<dyn MessageStore>,
        directory: Arc<dyn ApplicationDirectory>,
        notifier: Arc<dyn Notifier>,
        engine: Arc<dyn TimerEngine>,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                registry: JobRegistry::new(),
                engine,
                store,
                directory,
                notifier,
                stats: SchedulerStats::new(),
                recovered: AtomicBool::new(false),
            }),
        }
    }

    /// Create a scheduler on a [`TokioTimerEngine`] with at most
    /// `max_pending` concurrent jobs.
    pub fn with_tokio_engine(
        store: Arc<dyn MessageStore>,
        directory: Arc<dyn ApplicationDirectory>,
        notifier: Arc<dyn Notifier>,
        max_pending: usize,
    ) -> Self {
        Self::new(store, directory, notifier, Arc::new(TokioTimerEngine::new(max_pending)))
    }

    /// Deliver message `id` at `at`.
    ///
    /// An instant that is not in the future delivers as soon as possible.
    /// A job already registered for `id` is replaced and its timer cancelled.
    /// When the timer engine refuses the job the registry is left as it was
    /// and the message will not be delivered automatically.
    pub fn schedule_message(&self, id: MessageId, at: DateTime<Utc>) -> ScheduleResult<()> {
        let inner = &self.inner;
        let weak = Arc::downgrade(inner);
        let task: TimerTask = Box::new(move |job_id: JobId| {
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.fire(id, job_id).await;
                }
            }
            .boxed()
        });

        match inner.registry.put_with(id, || inner.engine.schedule(at, task)) {
            Ok(displaced) => {
                if let Some(old) = displaced {
                    inner.engine.cancel(&old);
                    inner.stats.record_replaced();
                    debug!("Replaced job {} for message {}", old.id(), id);
                }
                inner.stats.record_scheduled();
                debug!("Message {} scheduled for {}", id, at.to_rfc3339());
                Ok(())
            }
            Err(source) => {
                inner.stats.record_schedule_failure();
                error!("Failed to schedule message {}: {}", id, source);
                Err(ScheduleError::Timer { id, source })
            }
        }
    }

    /// Cancel the pending delivery of message `id`.
    ///
    /// Returns `false` when there was nothing to cancel: the message was
    /// never scheduled, already fired, or was cancelled before.
    pub fn cancel_message_schedule(&self, id: MessageId) -> bool {
        match self.inner.registry.remove(id) {
            Some(handle) => {
                self.inner.engine.cancel(&handle);
                self.inner.stats.record_cancelled();
                debug!("Cancelled job {} for message {}", handle.id(), id);
                true
            }
            None => false,
        }
    }

    /// Check whether message `id` has a live job.
    pub fn is_scheduled(&self, id: MessageId) -> bool {
        self.inner.registry.contains(id)
    }

    /// Instant the live job for `id` is due at.
    pub fn scheduled_at(&self, id: MessageId) -> Option<DateTime<Utc>> {
        self.inner.registry.get(id).map(|handle| handle.due_at())
    }

    /// Number of live jobs.
    pub fn pending_jobs(&self) -> usize {
        self.inner.registry.len()
    }

    /// Ids of all messages with a live job, sorted.
    pub fn scheduled_ids(&self) -> Vec<MessageId> {
        let mut ids = self.inner.registry.ids();
        ids.sort_unstable();
        ids
    }

    pub fn stats(&self) -> SchedulerStatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Cancel every pending timer and refuse new jobs.
    ///
    /// Deliveries already in flight run to completion. Postponements stay
    /// persisted and are picked up again by the next recovery.
    pub fn shutdown(&self) {
        let dropped = self.inner.registry.drain();
        self.inner.engine.shutdown();
        info!("Scheduler stopped, {} pending job(s) dropped", dropped.len());
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending_jobs", &self.pending_jobs())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
