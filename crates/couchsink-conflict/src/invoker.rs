//! Merge invoker
//!
//! Stamps the incoming document with the revision token just read from the
//! store, then runs both phases of the merge strategy.

use tracing::debug;

use couchsink_core::{
    domain::{ConflictBundle, Document, MergeResult},
    ports::IMerger,
};

use crate::error::ConflictError;

/// Runs `merger` over the incoming document and a complete conflict bundle
///
/// The incoming document's `_rev` is overwritten with the bundle's latest
/// token before the strategy sees it; a stale token from the record is never
/// written.
///
/// # Errors
/// Returns [`ConflictError::MergeFailed`] if either phase fails, or if the
/// first document of the batch is not the incoming document or carries no
/// revision token
pub fn invoke_merge(
    merger: &dyn IMerger,
    mut incoming: Document,
    bundle: ConflictBundle,
) -> Result<MergeResult, ConflictError> {
    let id = incoming.id().clone();
    incoming.set_revision(bundle.latest_revision());

    let failed = |source: anyhow::Error| ConflictError::MergeFailed {
        id: id.clone(),
        merger: merger.name().to_string(),
        source,
    };

    let (latest, siblings) = bundle.into_parts();
    let draft = merger.merge(incoming, &latest, &siblings).map_err(failed)?;
    let result = merger.process(draft).map_err(failed)?;

    let merged = result.merged();
    if merged.id() != &id {
        return Err(failed(anyhow::anyhow!(
            "merged document has id {}, expected {id}",
            merged.id()
        )));
    }
    if merged.revision().is_none() {
        return Err(failed(anyhow::anyhow!(
            "merged document carries no revision token"
        )));
    }

    debug!(
        doc_id = %id,
        merger = merger.name(),
        batch = result.len(),
        superseded = result.superseded_count(),
        "Merge produced write batch"
    );
    Ok(result)
}
