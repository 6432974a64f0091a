//! Revision and sibling fetchers
//!
//! Reads the state the merge needs: the latest body with its sibling list,
//! then the body of every sibling revision. Any rejected or unreadable read
//! is reported as [`ConflictError::FetchFailed`] so the resolver can retry
//! the whole fetch phase against a fresh snapshot.

use futures_util::future::try_join_all;
use tracing::{debug, trace};

use couchsink_core::{
    domain::{
        classify_result, DatabaseName, Document, DocumentId, Revision, RevisionSet, StoreFailure,
        StoreResponse, WriteOutcome, CONFLICT_STATUS_CODE,
    },
    ports::IDocumentStore,
};

use crate::error::ConflictError;

/// Reads the latest revision of a document together with its sibling ids
///
/// A body without `_conflicts` yields an empty sibling list.
///
/// # Errors
/// Returns [`ConflictError::FetchFailed`] if the read is rejected (the
/// document may have been deleted since the conflicting write) or the body is
/// not a usable document
pub async fn fetch_revision_set(
    store: &dyn IDocumentStore,
    database: &DatabaseName,
    id: &DocumentId,
) -> Result<RevisionSet, ConflictError> {
    let body = accepted_body(store.get_with_conflicts(database, id).await)?;
    let latest = parse_document(&body, id)?;

    let set = RevisionSet::from_document(latest)
        .map_err(|e| ConflictError::FetchFailed(unreadable(&body, e)))?;

    debug!(
        database = %database,
        doc_id = %id,
        latest_rev = %set.latest_revision(),
        siblings = set.conflict_revisions().len(),
        "Fetched revision set"
    );
    Ok(set)
}

/// Reads one sibling body at the given revision
///
/// A body that comes back without `_rev` is stamped with the requested one,
/// so the sibling can always be superseded later.
///
/// # Errors
/// Returns [`ConflictError::FetchFailed`] if the read is rejected or the body
/// is not the requested document
pub async fn fetch_sibling(
    store: &dyn IDocumentStore,
    database: &DatabaseName,
    id: &DocumentId,
    rev: &Revision,
) -> Result<Document, ConflictError> {
    let body = accepted_body(store.get_revision(database, id, rev).await)?;
    let mut sibling = parse_document(&body, id)?;

    if sibling.revision().is_none() {
        sibling.set_revision(rev);
    }

    trace!(database = %database, doc_id = %id, rev = %rev, "Fetched sibling");
    Ok(sibling)
}

/// Reads the body of every sibling revision
///
/// Reads are issued concurrently and returned in the order of `revs`. An
/// empty list returns immediately without touching the store. The first
/// failed read fails the whole call; a partial set is never returned.
///
/// # Errors
/// Returns [`ConflictError::FetchFailed`] for the first unreadable sibling
pub async fn fetch_all_siblings(
    store: &dyn IDocumentStore,
    database: &DatabaseName,
    id: &DocumentId,
    revs: &[Revision],
) -> Result<Vec<Document>, ConflictError> {
    if revs.is_empty() {
        return Ok(Vec::new());
    }

    let siblings =
        try_join_all(revs.iter().map(|rev| fetch_sibling(store, database, id, rev))).await?;

    debug!(
        database = %database,
        doc_id = %id,
        count = siblings.len(),
        "Fetched all siblings"
    );
    Ok(siblings)
}

/// Classifies a read and returns its body when accepted
fn accepted_body(result: anyhow::Result<StoreResponse>) -> Result<String, ConflictError> {
    match classify_result(result) {
        WriteOutcome::Accepted(body) => Ok(body),
        WriteOutcome::Conflict => Err(ConflictError::FetchFailed(StoreFailure::protocol(
            CONFLICT_STATUS_CODE,
            "unexpected conflict status on read",
            "",
        ))),
        WriteOutcome::Failed(failure) => Err(ConflictError::FetchFailed(failure)),
    }
}

/// Parses a read body and checks that it belongs to the requested document
fn parse_document(body: &str, id: &DocumentId) -> Result<Document, ConflictError> {
    let doc = Document::from_json_str(body)
        .map_err(|e| ConflictError::FetchFailed(unreadable(body, e)))?;

    if doc.id() != id {
        return Err(ConflictError::FetchFailed(StoreFailure::protocol(
            200,
            format!("read of {id} returned document {}", doc.id()),
            body,
        )));
    }
    Ok(doc)
}

fn unreadable(body: &str, error: impl std::fmt::Display) -> StoreFailure {
    StoreFailure::protocol(200, format!("unreadable document: {error}"), body)
}
