//! Fire-time delivery.

use tracing::{debug, error, info, warn};

use courier_protocols::MessageId;

use crate::error::ScheduleResult;
use crate::scheduler::SchedulerInner;
use crate::timer::JobId;

/// What happened when a job fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeliveryOutcome {
    /// The message was handed to the notifier.
    Delivered,
    /// The job had been cancelled or replaced before it could claim its entry.
    Superseded,
    /// The message was deleted before it came due.
    MessageGone,
    /// The message's application no longer resolves to a user.
    OwnerGone,
    /// A store or directory error aborted this delivery.
    Failed,
}

impl SchedulerInner {
    /// Run job `job_id` for message `id`.
    ///
    /// The registry entry is claimed first; a cancel that got there earlier
    /// wins and nothing is delivered. Errors are logged and never escape.
    pub(crate) async fn fire(&self, id: MessageId, job_id: JobId) -> DeliveryOutcome {
        if !self.registry.remove_job(id, job_id) {
            debug!("Job {} for message {} no longer registered, skipping", job_id, id);
            return DeliveryOutcome::Superseded;
        }

        match self.deliver(id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.stats.record_failed();
                error!("Delivery of message {} aborted: {}", id, e);
                DeliveryOutcome::Failed
            }
        }
    }

    async fn deliver(&self, id: MessageId) -> ScheduleResult<DeliveryOutcome> {
        let Some(mut message) = self.store.get(id).await? else {
            self.stats.record_stale();
            debug!("Message {} was deleted before delivery", id);
            return Ok(DeliveryOutcome::MessageGone);
        };

        let Some(owner) = self.directory.owner_of(message.application_id).await? else {
            self.stats.record_stale();
            warn!(
                "Application {} of message {} has no owner, delivery dropped",
                message.application_id, id
            );
            return Ok(DeliveryOutcome::OwnerGone);
        };

        self.store.clear_postponement(id).await?;
        message.postponed_at = None;

        self.notifier.deliver(owner, message).await;
        self.stats.record_delivered();
        info!("Delivered postponed message {} to user {}", id, owner);

        Ok(DeliveryOutcome::Delivered)
    }
}
