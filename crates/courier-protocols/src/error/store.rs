//! Message store errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Message not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::SerializationError(err.to_string())
    }
}
