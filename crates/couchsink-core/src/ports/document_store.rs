//! Document store port (driven/secondary port)
//!
//! The four requests the write pipeline issues against the store.
//!
//! ## Design Notes
//!
//! - Implementations return the raw [`StoreResponse`] for every request that
//!   produced a response, whatever its status. Interpreting the status is the
//!   job of the core classifier, so that the create attempt, the conflict
//!   reads and the bulk write-back are all judged by the same rules.
//! - `Err` is reserved for requests that never produced a response
//!   (connection failures, timeouts); callers map it to a `Failed` outcome.
//! - Implementations must attach the configured authorization to every request.

use async_trait::async_trait;

use crate::domain::{DatabaseName, Document, DocumentId, Revision, StoreResponse};

/// Request/response access to the document store
#[async_trait]
pub trait IDocumentStore: Send + Sync {
    /// `GET /{database}/{id}?conflicts=true`
    ///
    /// Reads the current revision including the `_conflicts` sibling list.
    async fn get_with_conflicts(
        &self,
        database: &DatabaseName,
        id: &DocumentId,
    ) -> anyhow::Result<StoreResponse>;

    /// `GET /{database}/{id}?rev={rev}`
    ///
    /// Reads the body of a specific revision.
    async fn get_revision(
        &self,
        database: &DatabaseName,
        id: &DocumentId,
        rev: &Revision,
    ) -> anyhow::Result<StoreResponse>;

    /// `POST /{database}`
    ///
    /// Creates a document; the store answers with a conflict status when the
    /// id already exists.
    async fn insert(&self, database: &DatabaseName, doc: &Document)
        -> anyhow::Result<StoreResponse>;

    /// `POST /{database}/_bulk_docs`
    ///
    /// Writes a batch of documents, applied atomically per document.
    async fn bulk_docs(
        &self,
        database: &DatabaseName,
        docs: &[Document],
    ) -> anyhow::Result<StoreResponse>;
}
