//! In-memory message store.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use courier_protocols::{
    Application, ApplicationDirectory, ApplicationId, DirectoryError, Message, MessageId,
    MessageStore, NewMessage, StoreError, UserId,
};

/// In-memory message store and application directory.
pub struct MemoryMessageStore {
    messages: RwLock<BTreeMap<MessageId, Message>>,
    applications: RwLock<HashMap<ApplicationId, Application>>,
    next_id: AtomicU64,
}

impl MemoryMessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(BTreeMap::new()),
            applications: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register an application, replacing one with the same id.
    pub async fn add_application(&self, application: Application) {
        self.applications.write().await.insert(application.id, application);
    }

    /// Forget an application. Its messages are kept.
    pub async fn remove_application(&self, id: ApplicationId) -> Option<Application> {
        self.applications.write().await.remove(&id)
    }

    /// Number of stored messages.
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

impl Default for MemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn get(&self, id: MessageId) -> Result<Option<Message>, StoreError> {
        Ok(self.messages.read().await.get(&id).cloned())
    }

    async fn list_due_at_or_after(&self, instant: DateTime<Utc>) -> Result<Vec<Message>, StoreError> {
        let messages = self.messages.read().await;
        let mut due: Vec<Message> = messages
            .values()
            .filter(|m| m.postponed_at.is_some_and(|at| at >= instant))
            .cloned()
            .collect();
        due.sort_by_key(|m| (m.postponed_at, m.id));
        Ok(due)
    }

    async fn count_overdue(&self, instant: DateTime<Utc>) -> Result<u64, StoreError> {
        let messages = self.messages.read().await;
        let overdue = messages
            .values()
            .filter(|m| m.postponed_at.is_some_and(|at| at < instant))
            .count();
        Ok(overdue as u64)
    }

    async fn list_by_application(&self, application_id: ApplicationId) -> Result<Vec<Message>, StoreError> {
        let messages = self.messages.read().await;
        Ok(messages
            .values()
            .filter(|m| m.application_id == application_id)
            .cloned()
            .collect())
    }

    async fn set_postponement(
        &self,
        id: MessageId,
        postponed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let mut messages = self.messages.write().await;
        let message = messages
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        message.postponed_at = postponed_at;
        Ok(())
    }

    async fn create(
        &self,
        application_id: ApplicationId,
        message: NewMessage,
        date: DateTime<Utc>,
    ) -> Result<Message, StoreError> {
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let message = message.into_message(id, application_id, date);
        self.messages.write().await.insert(id, message.clone());
        Ok(message)
    }

    async fn delete(&self, id: MessageId) -> Result<(), StoreError> {
        self.messages.write().await.remove(&id);
        Ok(())
    }

    async fn delete_by_application(&self, application_id: ApplicationId) -> Result<u64, StoreError> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|_, m| m.application_id != application_id);
        Ok((before - messages.len()) as u64)
    }
}

#[async_trait]
impl ApplicationDirectory for MemoryMessageStore {
    async fn applications_owned_by(&self, user_id: UserId) -> Result<Vec<Application>, DirectoryError> {
        let applications = self.applications.read().await;
        let mut owned: Vec<Application> = applications
            .values()
            .filter(|app| app.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by_key(|app| app.id);
        Ok(owned)
    }

    async fn get_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Option<Application>, DirectoryError> {
        Ok(self.applications.read().await.get(&application_id).cloned())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
