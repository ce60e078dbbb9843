//! Application directory errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Application not found: {0}")]
    NotFound(String),

    #[error("Directory lookup failed: {0}")]
    LookupFailed(String),
}
