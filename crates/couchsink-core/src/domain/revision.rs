//! Revision sets, conflict bundles and merge batches
//!
//! These values live only for the duration of one record's conflict
//! resolution. Their constructors enforce the invariants the merge stage
//! relies on: the latest body carries a revision token, and a bundle holds
//! exactly one body per sibling revision.

use super::document::{Document, CONFLICTS_FIELD};
use super::errors::DomainError;
use super::newtypes::Revision;

// ============================================================================
// RevisionSet
// ============================================================================

/// The current authoritative body plus the ids of its sibling revisions
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionSet {
    latest: Document,
    latest_revision: Revision,
    conflict_revisions: Vec<Revision>,
}

impl RevisionSet {
    /// Builds a revision set from a document read with conflicts included
    ///
    /// The `_conflicts` member is moved out of the body into
    /// [`conflict_revisions`](Self::conflict_revisions); the store refuses
    /// writes that carry it.
    ///
    /// # Errors
    /// Returns error if the body has no revision token or a malformed
    /// `_conflicts` member
    pub fn from_document(mut latest: Document) -> Result<Self, DomainError> {
        let latest_revision = latest.revision().ok_or_else(|| {
            DomainError::InvalidRevision(format!(
                "latest body of {} carries no revision token",
                latest.id()
            ))
        })?;
        let conflict_revisions = latest.conflicts()?;
        latest.remove(CONFLICTS_FIELD);

        Ok(Self {
            latest,
            latest_revision,
            conflict_revisions,
        })
    }

    /// The latest body, without `_conflicts`
    pub fn latest(&self) -> &Document {
        &self.latest
    }

    /// Revision token of the latest body
    pub fn latest_revision(&self) -> &Revision {
        &self.latest_revision
    }

    /// Sibling revision ids, in the order the store listed them
    pub fn conflict_revisions(&self) -> &[Revision] {
        &self.conflict_revisions
    }
}

// ============================================================================
// ConflictBundle
// ============================================================================

/// The latest body plus the fully materialized body of every sibling
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictBundle {
    latest: Document,
    latest_revision: Revision,
    conflict_documents: Vec<Document>,
}

impl ConflictBundle {
    /// Pairs a revision set with its fetched sibling bodies
    ///
    /// # Errors
    /// Returns [`DomainError::IncompleteConflictSet`] unless there is exactly
    /// one body per sibling revision id
    pub fn new(set: RevisionSet, conflict_documents: Vec<Document>) -> Result<Self, DomainError> {
        if conflict_documents.len() != set.conflict_revisions.len() {
            return Err(DomainError::IncompleteConflictSet {
                expected: set.conflict_revisions.len(),
                actual: conflict_documents.len(),
            });
        }

        Ok(Self {
            latest: set.latest,
            latest_revision: set.latest_revision,
            conflict_documents,
        })
    }

    /// The latest body
    pub fn latest(&self) -> &Document {
        &self.latest
    }

    /// Revision token of the latest body
    pub fn latest_revision(&self) -> &Revision {
        &self.latest_revision
    }

    /// Bodies of every sibling revision
    pub fn conflict_documents(&self) -> &[Document] {
        &self.conflict_documents
    }

    /// Consumes the bundle, returning `(latest, siblings)`
    pub fn into_parts(self) -> (Document, Vec<Document>) {
        (self.latest, self.conflict_documents)
    }
}

// ============================================================================
// MergeDraft / MergeResult
// ============================================================================

/// Intermediate output of a merge strategy
///
/// `merged` is the reconciled document; `superseded` lists the sibling
/// revisions the strategy wants removed.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeDraft {
    /// The new authoritative document
    pub merged: Document,
    /// Sibling revisions to mark deleted
    pub superseded: Vec<Document>,
}

/// Ordered batch of documents to write back in one bulk request
///
/// The first document is the merged one; it must carry the revision token
/// the store currently holds.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeResult {
    documents: Vec<Document>,
}

impl MergeResult {
    /// Creates a write batch
    ///
    /// # Errors
    /// Returns error if the batch is empty
    pub fn new(documents: Vec<Document>) -> Result<Self, DomainError> {
        if documents.is_empty() {
            return Err(DomainError::InvalidDocument(
                "merge produced an empty write batch".to_string(),
            ));
        }
        Ok(Self { documents })
    }

    /// The merged document (first element of the batch)
    pub fn merged(&self) -> &Document {
        &self.documents[0]
    }

    /// All documents in write order
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Number of documents in the batch
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Always false; a batch holds at least the merged document
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of documents marked deleted in the batch
    pub fn superseded_count(&self) -> usize {
        self.documents.iter().filter(|d| d.is_deleted()).count()
    }
}
