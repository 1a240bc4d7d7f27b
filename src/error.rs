//! Error taxonomy for the log store core.
//!
//! Validation failures are raised before any write happens. Storage failures are
//! fatal for the current operation and are never retried here.

use thiserror::Error;

/// Errors returned by the ingestion, query, and aggregation APIs.
#[derive(Error, Debug)]
pub enum LogStoreError {
    /// Malformed ingestion input or filter value.
    #[error("validation error: {0}")]
    Validation(String),

    /// Lookup of something that does not exist and must not be auto-created.
    #[error("not found: {0}")]
    NotFound(String),

    /// Underlying SQLite failure.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A stored `data` payload that does not decode as JSON.
    #[error("parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// A payload that could not be encoded for storage.
    #[error("serialization error: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl LogStoreError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// `true` for errors caused by caller input rather than the storage engine.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T, E = LogStoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_converts_from_rusqlite() {
        let err: LogStoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, LogStoreError::Storage(_)));
        assert!(!err.is_validation());
    }

    #[test]
    fn validation_message_is_descriptive() {
        let err = LogStoreError::validation("message must not be empty");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "validation error: message must not be empty");
    }
}
