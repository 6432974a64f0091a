//! Error types for conflict resolution

use couchsink_core::domain::{DocumentId, DomainError, Revision, StoreFailure};
use thiserror::Error;

/// Errors that can occur while resolving a write conflict
#[derive(Debug, Error)]
pub enum ConflictError {
    /// Reading the latest body or a sibling failed; retried by the resolver
    #[error("conflict fetch failed: {0}")]
    FetchFailed(StoreFailure),

    /// Every fetch attempt failed
    #[error("conflict fetch retries exhausted for {id} after {attempts} attempts: {last}")]
    RetriesExhausted {
        id: DocumentId,
        attempts: u32,
        last: StoreFailure,
    },

    /// The fetched siblings do not match the revision set
    #[error("incomplete conflict bundle for {id}: {source}")]
    IncompleteBundle {
        id: DocumentId,
        #[source]
        source: DomainError,
    },

    /// The merge strategy failed or produced an unusable batch
    #[error("merge strategy '{merger}' failed for {id}: {source:#}")]
    MergeFailed {
        id: DocumentId,
        merger: String,
        #[source]
        source: anyhow::Error,
    },

    /// The bulk write-back was rejected with a revision conflict
    #[error("write-back of {id} at revision {revision} hit a new conflict")]
    WriteConflict { id: DocumentId, revision: Revision },

    /// The bulk write-back failed
    #[error("write-back of {id} failed: {failure}")]
    WriteFailed { id: DocumentId, failure: StoreFailure },

    /// No merge strategy is registered under this name
    #[error("unknown merge strategy '{0}'; valid: incoming_wins, field_union")]
    UnknownStrategy(String),
}

impl ConflictError {
    /// Store status attached to the failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ConflictError::FetchFailed(failure)
            | ConflictError::RetriesExhausted { last: failure, .. }
            | ConflictError::WriteFailed { failure, .. } => failure.status,
            ConflictError::WriteConflict { .. } => {
                Some(couchsink_core::domain::CONFLICT_STATUS_CODE)
            }
            _ => None,
        }
    }

    /// Returns true if the resolver gave up after its retry bound
    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self, ConflictError::RetriesExhausted { .. })
    }
}
