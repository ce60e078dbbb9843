//! Error types for the scheduler.

use thiserror::Error;

use courier_protocols::{DirectoryError, MessageId, StoreError};

/// Errors raised by a [`TimerEngine`](crate::TimerEngine) when it refuses a timer.
#[derive(Debug, Error)]
pub enum TimerError {
    /// The engine was shut down.
    #[error("Timer engine is shut down")]
    ShutDown,

    /// No tokio runtime is available to drive the timer.
    #[error("No async runtime available: {0}")]
    NoRuntime(String),

    /// Too many timers are pending.
    #[error("Timer capacity exceeded: {0} pending")]
    CapacityExceeded(usize),
}

/// Errors surfaced to callers of the scheduler.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The timer engine rejected the job. The message stays persisted
    /// with its postponement but will not be delivered automatically.
    #[error("Failed to schedule message {id}: {source}")]
    Timer {
        id: MessageId,
        #[source]
        source: TimerError,
    },

    /// Startup recovery was requested a second time.
    #[error("Recovery has already run")]
    RecoveryAlreadyRun,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),
}

/// Result type for scheduler operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;
