use super::*;
use std::time::Duration;

use async_trait::async_trait;
use courier_protocols::StoreError;
use courier_store::MemoryMessageStore;
use courier_stream::StreamHub;

const OWNER: UserId = UserId(3);
const APP: ApplicationId = ApplicationId(11);

struct Harness {
    service: MessageService,
    store: Arc<MemoryMessageStore>,
    hub: Arc<StreamHub>,
}

async fn harness() -> Harness {
    let store = Arc::new(MemoryMessageStore::new());
    store
        .add_application(Application::new(APP, OWNER, "backups").with_default_priority(4))
        .await;
    store
        .add_application(Application::new(ApplicationId(12), OWNER, "deploys"))
        .await;
    let hub = Arc::new(StreamHub::default());
    let scheduler = Scheduler::with_tokio_engine(store.clone(), store.clone(), hub.clone(), 1000);
    let service = MessageService::new(store.clone(), store.clone(), hub.clone(), scheduler);
    Harness { service, store, hub }
}

fn in_ms(ms: i64) -> DateTime<Utc> {
    Utc::now() + chrono::Duration::milliseconds(ms)
}

#[tokio::test]
async fn test_create_applies_application_defaults() {
    let h = harness().await;
    let created = h
        .service
        .create_message(APP, NewMessage::new("disk full").with_title("   "))
        .await
        .unwrap();

    assert_eq!(created.title, "backups");
    assert_eq!(created.priority, 4);
}

#[tokio::test]
async fn test_create_keeps_explicit_values() {
    let h = harness().await;
    let created = h
        .service
        .create_message(APP, NewMessage::new("m").with_title("alert").with_priority(0))
        .await
        .unwrap();

    assert_eq!(created.title, "alert");
    assert_eq!(created.priority, 0);
}

#[tokio::test]
async fn test_create_unknown_application() {
    let h = harness().await;
    let err = h
        .service
        .create_message(ApplicationId(99), NewMessage::new("m"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_create_without_postponement_pushes_now() {
    let h = harness().await;
    let mut stream = h.hub.subscribe(OWNER);

    let created = h.service.create_message(APP, NewMessage::new("now")).await.unwrap();

    assert_eq!(stream.try_recv().unwrap().id, created.id);
    assert!(!h.service.scheduler().is_scheduled(created.id));
}

#[tokio::test]
async fn test_create_postponed_delivers_later() {
    let h = harness().await;
    let mut stream = h.hub.subscribe(OWNER);

    let created = h
        .service
        .create_message(APP, NewMessage::new("later").postponed_until(in_ms(80)))
        .await
        .unwrap();
    assert!(h.service.scheduler().is_scheduled(created.id));
    assert!(stream.try_recv().is_none());

    let delivered = tokio::time::timeout(Duration::from_secs(2), stream.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(delivered.id, created.id);
    assert!(delivered.postponed_at.is_none());
}

#[tokio::test]
async fn test_postpone_rejects_past() {
    let h = harness().await;
    let created = h.service.create_message(APP, NewMessage::new("m")).await.unwrap();

    let err = h
        .service
        .postpone_message(created.id, Utc::now() - chrono::Duration::seconds(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PostponeInPast(_)));
}

#[tokio::test]
async fn test_postpone_unknown_message() {
    let h = harness().await;
    let err = h
        .service
        .postpone_message(MessageId(500), in_ms(60_000))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_postpone_replaces_schedule_and_persists() {
    let h = harness().await;
    let created = h
        .service
        .create_message(APP, NewMessage::new("m").postponed_until(in_ms(60_000)))
        .await
        .unwrap();
    let at = in_ms(120_000);

    let updated = h.service.postpone_message(created.id, at).await.unwrap();

    assert_eq!(updated.postponed_at, Some(at));
    assert_eq!(h.service.scheduler().scheduled_at(created.id), Some(at));
    assert_eq!(h.service.scheduler().pending_jobs(), 1);
    assert_eq!(h.store.get(created.id).await.unwrap().unwrap().postponed_at, Some(at));
}

#[tokio::test]
async fn test_clear_postponement_cancels_without_delivery() {
    let h = harness().await;
    let mut stream = h.hub.subscribe(OWNER);
    let created = h
        .service
        .create_message(APP, NewMessage::new("m").postponed_until(in_ms(50)))
        .await
        .unwrap();

    let cleared = h.service.clear_postponement(created.id).await.unwrap();
    assert!(cleared.postponed_at.is_none());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(stream.try_recv().is_none());
    assert!(!h.service.scheduler().is_scheduled(created.id));
    assert!(h.store.get(created.id).await.unwrap().unwrap().postponed_at.is_none());
}

#[tokio::test]
async fn test_delete_message_cancels_job() {
    let h = harness().await;
    let created = h
        .service
        .create_message(APP, NewMessage::new("m").postponed_until(in_ms(60_000)))
        .await
        .unwrap();

    h.service.delete_message(created.id).await.unwrap();

    assert!(!h.service.scheduler().is_scheduled(created.id));
    assert!(h.store.get(created.id).await.unwrap().is_none());
    assert!(matches!(
        h.service.delete_message(created.id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_application_messages() {
    let h = harness().await;
    for _ in 0..3 {
        h.service
            .create_message(APP, NewMessage::new("m").postponed_until(in_ms(60_000)))
            .await
            .unwrap();
    }
    let other = h
        .service
        .create_message(ApplicationId(12), NewMessage::new("m").postponed_until(in_ms(60_000)))
        .await
        .unwrap();

    assert_eq!(h.service.delete_application_messages(APP).await.unwrap(), 3);
    assert_eq!(h.service.scheduler().scheduled_ids(), vec![other.id]);
}

#[tokio::test]
async fn test_delete_user_messages() {
    let h = harness().await;
    h.service
        .create_message(APP, NewMessage::new("a").postponed_until(in_ms(60_000)))
        .await
        .unwrap();
    h.service
        .create_message(ApplicationId(12), NewMessage::new("b").postponed_until(in_ms(60_000)))
        .await
        .unwrap();
    h.service.create_message(APP, NewMessage::new("c")).await.unwrap();

    assert_eq!(h.service.delete_user_messages(OWNER).await.unwrap(), 3);
    assert_eq!(h.service.scheduler().pending_jobs(), 0);
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_create_keeps_message_when_scheduling_fails() {
    let h = harness().await;
    h.service.scheduler().shutdown();
    let at = in_ms(60_000);

    let created = h
        .service
        .create_message(APP, NewMessage::new("m").postponed_until(at))
        .await
        .unwrap();

    assert_eq!(created.postponed_at, Some(at));
    assert_eq!(h.store.get(created.id).await.unwrap().unwrap().postponed_at, Some(at));
    assert_eq!(h.service.scheduler().pending_jobs(), 0);
    assert_eq!(h.service.scheduler().stats().schedule_failures, 1);
}

/// Memory store that refuses to store a new postponement.
struct ReadOnlyPostponements(Arc<MemoryMessageStore>);

#[async_trait]
impl MessageStore for ReadOnlyPostponements {
    async fn get(&self, id: MessageId) -> Result<Option<Message>, StoreError> {
        self.0.get(id).await
    }

    async fn list_due_at_or_after(&self, instant: DateTime<Utc>) -> Result<Vec<Message>, StoreError> {
        self.0.list_due_at_or_after(instant).await
    }

    async fn count_overdue(&self, instant: DateTime<Utc>) -> Result<u64, StoreError> {
        self.0.count_overdue(instant).await
    }

    async fn list_by_application(&self, application_id: ApplicationId) -> Result<Vec<Message>, StoreError> {
        self.0.list_by_application(application_id).await
    }

    async fn set_postponement(
        &self,
        id: MessageId,
        postponed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        match postponed_at {
            Some(_) => Err(StoreError::QueryError("database is locked".to_string())),
            None => self.0.set_postponement(id, None).await,
        }
    }

    async fn create(
        &self,
        application_id: ApplicationId,
        message: NewMessage,
        date: DateTime<Utc>,
    ) -> Result<Message, StoreError> {
        self.0.create(application_id, message, date).await
    }

    async fn delete(&self, id: MessageId) -> Result<(), StoreError> {
        self.0.delete(id).await
    }

    async fn delete_by_application(&self, application_id: ApplicationId) -> Result<u64, StoreError> {
        self.0.delete_by_application(application_id).await
    }
}

#[tokio::test]
async fn test_postpone_store_failure_leaves_nothing_scheduled() {
    let memory = Arc::new(MemoryMessageStore::new());
    memory.add_application(Application::new(APP, OWNER, "backups")).await;
    let store = Arc::new(ReadOnlyPostponements(memory.clone()));
    let hub = Arc::new(StreamHub::default());
    let mut stream = hub.subscribe(OWNER);
    let scheduler = Scheduler::with_tokio_engine(store.clone(), memory.clone(), hub.clone(), 1000);
    let service = MessageService::new(store, memory.clone(), hub.clone(), scheduler);

    let created = memory.create(APP, NewMessage::new("m"), Utc::now()).await.unwrap();

    let err = service.postpone_message(created.id, in_ms(50)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Store(_)));
    assert!(!service.scheduler().is_scheduled(created.id));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(stream.try_recv().is_none());
    assert!(memory.get(created.id).await.unwrap().unwrap().postponed_at.is_none());
}
