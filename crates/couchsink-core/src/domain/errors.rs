//! Domain error types
//!
//! Errors raised while validating identifiers and documents, and when an
//! invariant of the write pipeline's data model would be violated.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid document id
    #[error("Invalid document id: {0}")]
    InvalidDocumentId(String),

    /// Invalid revision token
    #[error("Invalid revision: {0}")]
    InvalidRevision(String),

    /// Invalid database name
    #[error("Invalid database name: {0}")]
    InvalidDatabaseName(String),

    /// The value cannot be represented as a document
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Attempt to change the id of an existing document
    #[error("Document id is immutable (attempted to change {current} to {attempted})")]
    ImmutableId {
        /// The id the document already carries
        current: String,
        /// The id that was attempted
        attempted: String,
    },

    /// A conflict bundle does not hold one body per sibling revision
    #[error("Incomplete conflict set: expected {expected} sibling documents, got {actual}")]
    IncompleteConflictSet {
        /// Number of sibling revision ids in the revision set
        expected: usize,
        /// Number of sibling bodies actually supplied
        actual: usize,
    },
}
