//! Error taxonomy of the sink pipeline

use couchsink_conflict::ConflictError;
use couchsink_core::domain::{DatabaseName, DocumentId, DomainError, StoreFailure};
use couchsink_store::StoreError;
use thiserror::Error;

/// Fatal errors of a sink batch
///
/// Conflicts are not errors: they send the record to the resolver. Every
/// variant here aborts the record, and with it the remainder of the batch.
#[derive(Debug, Error)]
pub enum SinkError {
    /// No database is configured for the record's topic
    #[error("no database mapping for topic '{topic}'")]
    NoRoute { topic: String },

    /// The payload cannot be represented as a document
    #[error("record from '{topic}' cannot be converted to a document: {source:#}")]
    Conversion {
        topic: String,
        #[source]
        source: anyhow::Error,
    },

    /// The converted payload lacks a usable `_id`
    #[error("record from '{topic}' has no valid document id: {source}")]
    MissingId {
        topic: String,
        #[source]
        source: DomainError,
    },

    /// The create attempt was rejected for a reason other than a conflict
    #[error("insert of {id} into {database} failed: {failure}")]
    InsertRejected {
        database: DatabaseName,
        id: DocumentId,
        failure: StoreFailure,
    },

    /// Conflict resolution failed
    #[error("conflict resolution in {database} failed: {source}")]
    Resolution {
        database: DatabaseName,
        #[source]
        source: ConflictError,
    },

    /// The task was stopped before the batch settled
    #[error("sink task stopped before the batch completed")]
    Cancelled,

    /// The configuration cannot be used to start the task
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The store client could not be built
    #[error("store client error: {0}")]
    Store(#[from] StoreError),
}

impl SinkError {
    /// Store status attached to the failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            SinkError::InsertRejected { failure, .. } => failure.status,
            SinkError::Resolution { source, .. } => source.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_passthrough() {
        let err = SinkError::InsertRejected {
            database: "orders".parse().unwrap(),
            id: "d1".parse().unwrap(),
            failure: StoreFailure::protocol(500, "Response contained error status", "boom"),
        };
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("orders"));

        assert_eq!(SinkError::NoRoute { topic: "t".into() }.status(), None);
    }

    #[test]
    fn test_resolution_message_keeps_cause() {
        let err = SinkError::Resolution {
            database: "orders".parse().unwrap(),
            source: ConflictError::RetriesExhausted {
                id: "d1".parse().unwrap(),
                attempts: 2,
                last: StoreFailure::transport("connection refused"),
            },
        };
        assert!(err.to_string().contains("retries exhausted"));
        assert_eq!(err.status(), None);
    }
}
