//! Message store protocol.
//!
//! The store is the single source of truth for `postponed_at`. The scheduler
//! reads it at startup and at fire time, and clears it after delivery.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::message::{Message, NewMessage};
use crate::types::{ApplicationId, MessageId};

/// Persistence layer for messages. Implementations must be thread-safe.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Load a message by id.
    async fn get(&self, id: MessageId) -> Result<Option<Message>, StoreError>;

    /// Check whether a message exists.
    async fn contains(&self, id: MessageId) -> Result<bool, StoreError> {
        Ok(self.get(id).await?.is_some())
    }

    /// All messages whose `postponed_at` is at or after `instant`,
    /// earliest first.
    async fn list_due_at_or_after(&self, instant: DateTime<Utc>) -> Result<Vec<Message>, StoreError>;

    /// Number of messages whose `postponed_at` is strictly before `instant`.
    async fn count_overdue(&self, instant: DateTime<Utc>) -> Result<u64, StoreError>;

    /// All messages sent through an application.
    async fn list_by_application(&self, application_id: ApplicationId) -> Result<Vec<Message>, StoreError>;

    /// Reset `postponed_at` to `None`.
    async fn clear_postponement(&self, id: MessageId) -> Result<(), StoreError> {
        self.set_postponement(id, None).await
    }

    /// Overwrite `postponed_at`.
    async fn set_postponement(
        &self,
        id: MessageId,
        postponed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    /// Persist a new message; the store assigns the id.
    async fn create(
        &self,
        application_id: ApplicationId,
        message: NewMessage,
        date: DateTime<Utc>,
    ) -> Result<Message, StoreError>;

    /// Delete a message. Deleting an unknown id is not an error.
    async fn delete(&self, id: MessageId) -> Result<(), StoreError>;

    /// Delete every message of an application, returning how many were removed.
    async fn delete_by_application(&self, application_id: ApplicationId) -> Result<u64, StoreError>;
}
