//! Bulk cancellation by application or user.
//!
//! Read-then-cancel. A message created after the read keeps its job.
//! A failed read is returned to the caller; cancellations made before it
//! stay in effect.

use tracing::debug;

use courier_protocols::{ApplicationId, UserId};

use crate::error::ScheduleResult;
use crate::scheduler::Scheduler;

impl Scheduler {
    /// Cancel the pending deliveries of every message of an application.
    ///
    /// Returns how many jobs were cancelled.
    pub async fn cancel_application_schedule(
        &self,
        application_id: ApplicationId,
    ) -> ScheduleResult<usize> {
        let messages = self.inner.store.list_by_application(application_id).await?;

        let mut cancelled = 0;
        for message in &messages {
            if self.cancel_message_schedule(message.id) {
                cancelled += 1;
            }
        }

        debug!(
            "Cancelled {} job(s) across {} message(s) of application {}",
            cancelled,
            messages.len(),
            application_id
        );
        Ok(cancelled)
    }

    /// Cancel the pending deliveries of every message of every application
    /// owned by a user.
    pub async fn cancel_user_schedule(&self, user_id: UserId) -> ScheduleResult<usize> {
        let applications = self.inner.directory.applications_owned_by(user_id).await?;

        let mut cancelled = 0;
        for application in applications {
            cancelled += self.cancel_application_schedule(application.id).await?;
        }

        debug!("Cancelled {} job(s) for user {}", cancelled, user_id);
        Ok(cancelled)
    }
}

#[cfg(test)]
#[path = "cascade_tests.rs"]
mod tests;
