//! Conflict resolution state machine
//!
//! Entered after a create attempt came back as a conflict. One pass runs:
//!
//! ```text
//! FetchingRevisions -> FetchingSiblings -> Merging -> Writing -> Done
//!         ^                   |                          |
//!         +---- RetryLoop <---+                          +-> FatallyFailed
//! ```
//!
//! Only the fetch phase is retried: a failed read re-enters
//! `FetchingRevisions` so the merge always sees one consistent snapshot.
//! Merge failures and a rejected write-back are fatal.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use couchsink_core::{
    domain::{
        classify_result, ConflictBundle, DatabaseName, Document, DocumentId,
        MergeResult, Revision, RevisionSet, StoreFailure, WriteOutcome,
    },
    ports::{IDocumentStore, IMerger},
};

use crate::{
    error::ConflictError,
    fetcher::{fetch_all_siblings, fetch_revision_set},
    invoker::invoke_merge,
};

/// Default number of fetch retries after the first attempt
pub const DEFAULT_MAX_FETCH_RETRIES: u32 = 5;

/// Default upper bound on a single backoff delay
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Bound and pacing of the fetch retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first fetch attempt
    pub max_retries: u32,
    /// Base delay, doubled after every failed attempt; zero disables sleeping
    pub backoff_base: Duration,
    /// Cap on any single delay
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base: Duration) -> Self {
        Self {
            max_retries,
            backoff_base,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }

    /// Replaces the cap on a single delay
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Retry bound without any delay between attempts
    pub fn immediate(max_retries: u32) -> Self {
        Self::new(max_retries, Duration::ZERO)
    }

    /// Delay before the given retry (1-based), never above `max_backoff`
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.backoff_base
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FETCH_RETRIES, Duration::from_millis(50))
    }
}

/// Summary of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionReport {
    /// Document that was merged
    pub id: DocumentId,
    /// Revision token the merged document was written against
    pub revision: Revision,
    /// Fetch attempts used, including the successful one
    pub attempts: u32,
    /// Number of sibling revisions that were read
    pub siblings: usize,
    /// Number of documents in the write-back batch
    pub written: usize,
    /// Wall time spent resolving
    pub duration_ms: u64,
}

/// States of one resolution pass
enum ResolutionState {
    FetchingRevisions,
    FetchingSiblings(RevisionSet),
    Merging(ConflictBundle),
    Writing(MergeResult),
    RetryLoop(StoreFailure),
}

/// Resolves write conflicts by fetching, merging and writing back
pub struct ConflictResolver {
    store: Arc<dyn IDocumentStore>,
    merger: Arc<dyn IMerger>,
    policy: RetryPolicy,
}

impl ConflictResolver {
    pub fn new(
        store: Arc<dyn IDocumentStore>,
        merger: Arc<dyn IMerger>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            merger,
            policy,
        }
    }

    /// Resolves a conflicting write of `incoming` into `database`
    ///
    /// Returns once the merged batch was accepted by the store, or with the
    /// first fatal error.
    ///
    /// # Errors
    /// - [`ConflictError::RetriesExhausted`] if every fetch attempt failed
    /// - [`ConflictError::MergeFailed`] if the merge strategy failed
    /// - [`ConflictError::WriteConflict`] / [`ConflictError::WriteFailed`]
    ///   if the write-back was rejected
    pub async fn resolve(
        &self,
        database: &DatabaseName,
        incoming: &Document,
    ) -> Result<ResolutionReport, ConflictError> {
        let started = Instant::now();
        let id = incoming.id().clone();
        let store = self.store.as_ref();

        let mut attempts: u32 = 1;
        let mut siblings = 0;
        let mut state = ResolutionState::FetchingRevisions;

        info!(
            database = %database,
            doc_id = %id,
            merger = self.merger.name(),
            "Resolving write conflict"
        );

        loop {
            state = match state {
                ResolutionState::FetchingRevisions => {
                    match fetch_revision_set(store, database, &id).await {
                        Ok(set) => ResolutionState::FetchingSiblings(set),
                        Err(ConflictError::FetchFailed(failure)) => {
                            ResolutionState::RetryLoop(failure)
                        }
                        Err(e) => return Err(e),
                    }
                }

                ResolutionState::FetchingSiblings(set) => {
                    let fetched =
                        fetch_all_siblings(store, database, &id, set.conflict_revisions()).await;
                    match fetched {
                        Ok(docs) => {
                            siblings = docs.len();
                            let bundle = ConflictBundle::new(set, docs).map_err(|source| {
                                ConflictError::IncompleteBundle {
                                    id: id.clone(),
                                    source,
                                }
                            })?;
                            ResolutionState::Merging(bundle)
                        }
                        Err(ConflictError::FetchFailed(failure)) => {
                            ResolutionState::RetryLoop(failure)
                        }
                        Err(e) => return Err(e),
                    }
                }

                ResolutionState::Merging(bundle) => ResolutionState::Writing(invoke_merge(
                    self.merger.as_ref(),
                    incoming.clone(),
                    bundle,
                )?),

                ResolutionState::Writing(batch) => {
                    let revision = self.write_back(database, &id, batch.documents()).await?;
                    let report = ResolutionReport {
                        id,
                        revision,
                        attempts,
                        siblings,
                        written: batch.len(),
                        duration_ms: started.elapsed().as_millis() as u64,
                    };
                    info!(
                        database = %database,
                        doc_id = %report.id,
                        attempts = report.attempts,
                        siblings = report.siblings,
                        written = report.written,
                        duration_ms = report.duration_ms,
                        "Write conflict resolved"
                    );
                    return Ok(report);
                }

                ResolutionState::RetryLoop(failure) => {
                    if attempts > self.policy.max_retries {
                        error!(
                            database = %database,
                            doc_id = %id,
                            attempts,
                            status = ?failure.status,
                            error = %failure,
                            "conflict fetch retries exhausted"
                        );
                        return Err(ConflictError::RetriesExhausted {
                            id,
                            attempts,
                            last: failure,
                        });
                    }

                    let delay = self.policy.delay_for(attempts);
                    warn!(
                        database = %database,
                        doc_id = %id,
                        attempt = attempts,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure,
                        "Conflict fetch failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempts += 1;
                    ResolutionState::FetchingRevisions
                }
            };
        }
    }

    /// Submits the merge batch and checks every per-document result
    async fn write_back(
        &self,
        database: &DatabaseName,
        id: &DocumentId,
        documents: &[Document],
    ) -> Result<Revision, ConflictError> {
        let revision = documents
            .first()
            .and_then(Document::revision)
            .ok_or_else(|| ConflictError::MergeFailed {
                id: id.clone(),
                merger: self.merger.name().to_string(),
                source: anyhow::anyhow!("write batch has no stamped document"),
            })?;

        debug!(database = %database, doc_id = %id, count = documents.len(), "Writing merge batch");

        let outcome = match self.store.bulk_docs(database, documents).await {
            Ok(response) => response.classify_bulk(),
            Err(e) => classify_result(Err(e)),
        };

        match outcome {
            WriteOutcome::Accepted(_) => Ok(revision),
            WriteOutcome::Conflict => Err(ConflictError::WriteConflict {
                id: id.clone(),
                revision,
            }),
            WriteOutcome::Failed(failure) => Err(ConflictError::WriteFailed {
                id: id.clone(),
                failure,
            }),
        }
    }
}
