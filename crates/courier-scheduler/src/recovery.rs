//! Startup recovery: rebuild the job table from the store.

use std::sync::atomic::Ordering;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ScheduleError, ScheduleResult};
use crate::scheduler::Scheduler;

/// Outcome of [`Scheduler::recover_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
    /// Messages given a job.
    pub scheduled: usize,

    /// Messages the timer engine refused.
    pub failed: usize,

    /// Messages that came due while the process was down. They are left
    /// postponed and are not delivered.
    pub overdue_skipped: u64,
}

impl Scheduler {
    /// Schedule every message whose postponement is at or after now.
    ///
    /// Runs once per scheduler, before external requests are accepted. A
    /// second call fails with [`ScheduleError::RecoveryAlreadyRun`]; a call
    /// that fails to read the store may be retried.
    pub async fn recover_all(&self) -> ScheduleResult<RecoveryReport> {
        if self.inner.recovered.swap(true, Ordering::SeqCst) {
            return Err(ScheduleError::RecoveryAlreadyRun);
        }

        let now = Utc::now();
        let due = match self.inner.store.list_due_at_or_after(now).await {
            Ok(due) => due,
            Err(e) => {
                self.inner.recovered.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        };

        let mut report = RecoveryReport::default();
        for message in due {
            let Some(at) = message.postponed_at else {
                continue;
            };
            match self.schedule_message(message.id, at) {
                Ok(()) => report.scheduled += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!("Recovery could not schedule message {}: {}", message.id, e);
                }
            }
        }

        match self.inner.store.count_overdue(now).await {
            Ok(overdue) => report.overdue_skipped = overdue,
            Err(e) => warn!("Could not count overdue messages: {}", e),
        }
        if report.overdue_skipped > 0 {
            warn!(
                "{} postponed message(s) came due while offline and will not be delivered \
                 until postponed again",
                report.overdue_skipped
            );
        }

        info!(
            "Recovery scheduled {} message(s), {} failed",
            report.scheduled, report.failed
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
