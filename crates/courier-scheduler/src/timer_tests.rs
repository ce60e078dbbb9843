use super::*;
use futures::FutureExt;
use std::sync::atomic::AtomicU32;

fn counting_task(counter: Arc<AtomicU32>) -> TimerTask {
    Box::new(move |_job_id: JobId| {
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        .boxed()
    })
}

#[tokio::test]
async fn test_timer_fires_at_instant() {
    let engine = TokioTimerEngine::default();
    let counter = Arc::new(AtomicU32::new(0));

    let at = Utc::now() + chrono::Duration::milliseconds(50);
    let handle = engine.schedule(at, counting_task(counter.clone())).unwrap();
    assert_eq!(handle.due_at(), at);
    assert_eq!(engine.pending(), 1);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(handle.has_fired());
    assert_eq!(engine.pending(), 0);
}

#[tokio::test]
async fn test_past_instant_fires_immediately() {
    let engine = TokioTimerEngine::default();
    let counter = Arc::new(AtomicU32::new(0));

    let at = Utc::now() - chrono::Duration::hours(1);
    engine.schedule(at, counting_task(counter.clone())).unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_task_receives_its_job_id() {
    let engine = TokioTimerEngine::default();
    let seen = Arc::new(parking_lot::Mutex::new(None));

    let sink = seen.clone();
    let handle = engine
        .schedule(
            Utc::now(),
            Box::new(move |job_id: JobId| {
                async move {
                    *sink.lock() = Some(job_id);
                }
                .boxed()
            }),
        )
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*seen.lock(), Some(handle.id()));
}

#[tokio::test]
async fn test_cancel_before_fire() {
    let engine = TokioTimerEngine::default();
    let counter = Arc::new(AtomicU32::new(0));

    let at = Utc::now() + chrono::Duration::milliseconds(50);
    let handle = engine.schedule(at, counting_task(counter.clone())).unwrap();
    engine.cancel(&handle);
    assert!(handle.is_cancelled());

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 0);
    assert!(!handle.has_fired());
    assert_eq!(engine.pending(), 0);
}

#[tokio::test]
async fn test_cancel_does_not_abort_running_callback() {
    let engine = TokioTimerEngine::default();
    let counter = Arc::new(AtomicU32::new(0));

    let done = counter.clone();
    let handle = engine
        .schedule(
            Utc::now(),
            Box::new(move |_: JobId| {
                async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    done.fetch_add(1, Ordering::SeqCst);
                }
                .boxed()
            }),
        )
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(handle.has_fired());
    engine.cancel(&handle);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_slow_callback_does_not_block_other_timers() {
    let engine = TokioTimerEngine::default();
    let counter = Arc::new(AtomicU32::new(0));

    engine
        .schedule(
            Utc::now(),
            Box::new(|_: JobId| {
                async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                .boxed()
            }),
        )
        .unwrap();
    engine
        .schedule(Utc::now() + chrono::Duration::milliseconds(10), counting_task(counter.clone()))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_capacity_exceeded() {
    let engine = TokioTimerEngine::new(1);
    let counter = Arc::new(AtomicU32::new(0));
    let later = Utc::now() + chrono::Duration::hours(1);

    engine.schedule(later, counting_task(counter.clone())).unwrap();
    let result = engine.schedule(later, counting_task(counter.clone()));
    assert!(matches!(result, Err(TimerError::CapacityExceeded(1))));
}

#[tokio::test]
async fn test_capacity_released_after_cancel() {
    let engine = TokioTimerEngine::new(1);
    let counter = Arc::new(AtomicU32::new(0));
    let later = Utc::now() + chrono::Duration::hours(1);

    let handle = engine.schedule(later, counting_task(counter.clone())).unwrap();
    engine.cancel(&handle);
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(engine.schedule(later, counting_task(counter)).is_ok());
}

#[tokio::test]
async fn test_shutdown_cancels_and_refuses() {
    let engine = TokioTimerEngine::default();
    let counter = Arc::new(AtomicU32::new(0));

    let handle = engine
        .schedule(Utc::now() + chrono::Duration::milliseconds(30), counting_task(counter.clone()))
        .unwrap();
    engine.shutdown();
    assert!(engine.is_shut_down());
    assert!(handle.is_cancelled());

    let result = engine.schedule(Utc::now(), counting_task(counter.clone()));
    assert!(matches!(result, Err(TimerError::ShutDown)));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_dropping_engine_cancels_pending_timers() {
    let engine = TokioTimerEngine::default();
    let counter = Arc::new(AtomicU32::new(0));

    let handle = engine
        .schedule(Utc::now() + chrono::Duration::milliseconds(30), counting_task(counter.clone()))
        .unwrap();
    drop(engine);
    assert!(handle.is_cancelled());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn test_schedule_without_runtime() {
    let engine = TokioTimerEngine::default();
    let result = engine.schedule(Utc::now(), Box::new(|_: JobId| async {}.boxed()));
    assert!(matches!(result, Err(TimerError::NoRuntime(_))));
    assert_eq!(engine.pending(), 0);
}
