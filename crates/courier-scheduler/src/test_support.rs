//! Fakes shared by the scheduler's unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use courier_protocols::{
    Application, ApplicationId, Message, MessageId, MessageStore, NewMessage, Notifier, StoreError,
    UserId,
};
use courier_store::MemoryMessageStore;

use crate::scheduler::Scheduler;
use crate::timer::TokioTimerEngine;

pub const OWNER: UserId = UserId(7);
pub const APP: ApplicationId = ApplicationId(1);

/// Notifier that records every delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    deliveries: Mutex<Vec<(UserId, Message)>>,
}

impl RecordingNotifier {
    pub fn deliveries(&self) -> Vec<(UserId, Message)> {
        self.deliveries.lock().clone()
    }

    pub fn count_for(&self, id: MessageId) -> usize {
        self.deliveries.lock().iter().filter(|(_, m)| m.id == id).count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, owner: UserId, message: Message) {
        self.deliveries.lock().push((owner, message));
    }
}

/// Store wrapper whose reads and writes can be made to fail.
pub struct FailingStore {
    inner: Arc<MemoryMessageStore>,
    pub fail_get: AtomicBool,
    pub fail_clear: AtomicBool,
    pub fail_list: AtomicBool,
}

impl FailingStore {
    pub fn new(inner: Arc<MemoryMessageStore>) -> Self {
        Self {
            inner,
            fail_get: AtomicBool::new(false),
            fail_clear: AtomicBool::new(false),
            fail_list: AtomicBool::new(false),
        }
    }

    fn check(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::ConnectionError("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MessageStore for FailingStore {
    async fn get(&self, id: MessageId) -> Result<Option<Message>, StoreError> {
        Self::check(&self.fail_get)?;
        self.inner.get(id).await
    }

    async fn list_due_at_or_after(&self, instant: DateTime<Utc>) -> Result<Vec<Message>, StoreError> {
        Self::check(&self.fail_list)?;
        self.inner.list_due_at_or_after(instant).await
    }

    async fn count_overdue(&self, instant: DateTime<Utc>) -> Result<u64, StoreError> {
        self.inner.count_overdue(instant).await
    }

    async fn list_by_application(&self, application_id: ApplicationId) -> Result<Vec<Message>, StoreError> {
        Self::check(&self.fail_list)?;
        self.inner.list_by_application(application_id).await
    }

    async fn set_postponement(
        &self,
        id: MessageId,
        postponed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        Self::check(&self.fail_clear)?;
        self.inner.set_postponement(id, postponed_at).await
    }

    async fn create(
        &self,
        application_id: ApplicationId,
        message: NewMessage,
        date: DateTime<Utc>,
    ) -> Result<Message, StoreError> {
        self.inner.create(application_id, message, date).await
    }

    async fn delete(&self, id: MessageId) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }

    async fn delete_by_application(&self, application_id: ApplicationId) -> Result<u64, StoreError> {
        self.inner.delete_by_application(application_id).await
    }
}

/// A scheduler over a memory store holding application [`APP`] owned by [`OWNER`].
pub struct Fixture {
    pub scheduler: Scheduler,
    pub store: Arc<MemoryMessageStore>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryMessageStore::new());
        store.add_application(Application::new(APP, OWNER, "backups")).await;
        Self::with_store(store.clone(), store)
    }

    /// Build the scheduler around `messages`, using `directory` for owners.
    pub fn with_store(
        directory: Arc<MemoryMessageStore>,
        messages: Arc<dyn MessageStore>,
    ) -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        let scheduler = Scheduler::new(
            messages,
            directory.clone(),
            notifier.clone(),
            Arc::new(TokioTimerEngine::default()),
        );
        Self {
            scheduler,
            store: directory,
            notifier,
        }
    }

    /// Persist a message postponed until `at`.
    pub async fn postponed(&self, app: ApplicationId, at: DateTime<Utc>) -> Message {
        self.store
            .create(app, NewMessage::new("body").with_title("t").postponed_until(at), Utc::now())
            .await
            .unwrap()
    }
}
