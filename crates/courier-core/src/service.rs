//! Message flows.
//!
//! Every flow that changes a message's postponement or removes messages
//! goes through the scheduler first, then the store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use courier_protocols::{
    Application, ApplicationDirectory, ApplicationId, Message, MessageId, MessageStore, NewMessage,
    Notifier, UserId,
};
use courier_scheduler::Scheduler;

use crate::error::{ServiceError, ServiceResult};

/// Message operations for the request layer.
pub struct MessageService {
    store: Arc<dyn MessageStore>,
    directory: Arc<dyn ApplicationDirectory>,
    notifier: Arc<dyn Notifier>,
    scheduler: Scheduler,
}

impl MessageService {
    pub fn new(
        store: Arc<dyn MessageStore>,
        directory: Arc<dyn ApplicationDirectory>,
        notifier: Arc<dyn Notifier>,
        scheduler: Scheduler,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            scheduler,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Create a message sent through `application_id`.
    ///
    /// A blank title becomes the application name and a missing priority the
    /// application's default. Postponed messages are scheduled, the rest are
    /// pushed to the owner right away. If scheduling fails the message stays
    /// stored with its postponement and is returned anyway.
    pub async fn create_message(
        &self,
        application_id: ApplicationId,
        mut message: NewMessage,
    ) -> ServiceResult<Message> {
        let application = self.application(application_id).await?;

        if message.title.trim().is_empty() {
            message.title = application.name.clone();
        }
        if message.priority.is_none() {
            message.priority = Some(application.default_priority);
        }

        let created = self.store.create(application_id, message, Utc::now()).await?;

        match created.postponed_at {
            Some(at) => {
                if let Err(e) = self.scheduler.schedule_message(created.id, at) {
                    warn!("Message {} stored but not scheduled: {}", created.id, e);
                }
            }
            None => {
                self.notifier.deliver(application.user_id, created.clone()).await;
            }
        }

        Ok(created)
    }

    /// Hold message `id` back until `at`, replacing any earlier postponement.
    ///
    /// If the new instant cannot be stored, the new job is cancelled again
    /// and the message is left unscheduled.
    pub async fn postpone_message(&self, id: MessageId, at: DateTime<Utc>) -> ServiceResult<Message> {
        if at <= Utc::now() {
            return Err(ServiceError::PostponeInPast(at));
        }
        let mut message = self.message(id).await?;

        self.scheduler.cancel_message_schedule(id);
        self.scheduler.schedule_message(id, at)?;
        if let Err(e) = self.store.set_postponement(id, Some(at)).await {
            self.scheduler.cancel_message_schedule(id);
            return Err(e.into());
        }

        info!("Message {} postponed until {}", id, at.to_rfc3339());
        message.postponed_at = Some(at);
        Ok(message)
    }

    /// Drop the postponement of message `id` without delivering it.
    pub async fn clear_postponement(&self, id: MessageId) -> ServiceResult<Message> {
        let mut message = self.message(id).await?;

        self.scheduler.cancel_message_schedule(id);
        self.store.clear_postponement(id).await?;

        message.postponed_at = None;
        Ok(message)
    }

    pub async fn delete_message(&self, id: MessageId) -> ServiceResult<()> {
        self.message(id).await?;

        self.scheduler.cancel_message_schedule(id);
        self.store.delete(id).await?;
        Ok(())
    }

    /// Delete every message of an application. Returns how many were deleted.
    pub async fn delete_application_messages(&self, application_id: ApplicationId) -> ServiceResult<u64> {
        self.application(application_id).await?;

        self.scheduler.cancel_application_schedule(application_id).await?;
        let deleted = self.store.delete_by_application(application_id).await?;

        info!("Deleted {} message(s) of application {}", deleted, application_id);
        Ok(deleted)
    }

    /// Delete every message of every application owned by `user_id`.
    pub async fn delete_user_messages(&self, user_id: UserId) -> ServiceResult<u64> {
        self.scheduler.cancel_user_schedule(user_id).await?;

        let mut deleted = 0;
        for application in self.directory.applications_owned_by(user_id).await? {
            deleted += self.store.delete_by_application(application.id).await?;
        }

        info!("Deleted {} message(s) of user {}", deleted, user_id);
        Ok(deleted)
    }

    async fn message(&self, id: MessageId) -> ServiceResult<Message> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("message {}", id)))
    }

    async fn application(&self, id: ApplicationId) -> ServiceResult<Application> {
        self.directory
            .get_application(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("application {}", id)))
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
