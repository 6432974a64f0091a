//! Merge strategy port
//!
//! A merger reconciles an incoming write with the latest stored body and all
//! of its sibling conflict revisions. Strategies are selected by
//! configuration or injected by the host, and are invoked through
//! `dyn IMerger`.
//!
//! ## Contract
//!
//! - `incoming` arrives already stamped with the latest revision token.
//! - The first document of the resulting batch must carry that token (or a
//!   freshly obtained one), otherwise the store rejects the write.
//! - Every sibling must be accounted for, either superseded in the batch or
//!   folded into the merged document.
//!
//! The two phases let a strategy keep reconciliation (`merge`) apart from
//! shaping the write batch (`process`).

use crate::domain::{Document, MergeDraft, MergeResult};

/// Pluggable conflict reconciliation strategy
pub trait IMerger: Send + Sync {
    /// Short identifier used in logs and configuration
    fn name(&self) -> &str;

    /// Reconciles the incoming document with the latest body and siblings
    ///
    /// # Errors
    /// Returns an error when the documents cannot be reconciled
    fn merge(
        &self,
        incoming: Document,
        latest: &Document,
        conflicts: &[Document],
    ) -> anyhow::Result<MergeDraft>;

    /// Shapes a draft into the ordered write batch
    ///
    /// The default writes the merged document first, followed by a removal
    /// marker for every superseded sibling.
    ///
    /// # Errors
    /// Returns an error if a superseded sibling has no revision token
    fn process(&self, draft: MergeDraft) -> anyhow::Result<MergeResult> {
        let mut documents = Vec::with_capacity(draft.superseded.len() + 1);
        documents.push(draft.merged);
        for sibling in &draft.superseded {
            documents.push(sibling.tombstone()?);
        }
        Ok(MergeResult::new(documents)?)
    }
}
