//! Error types for message flows.

use chrono::{DateTime, Utc};
use thiserror::Error;

use courier_protocols::{DirectoryError, StoreError};
use courier_scheduler::ScheduleError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The message or application does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A postponement must lie in the future.
    #[error("Postponement must be in the future, got {}", .0.to_rfc3339())]
    PostponeInPast(DateTime<Utc>),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
