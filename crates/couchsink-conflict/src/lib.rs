//! couchsink Conflict - Conflict fetching, merging and resolution
//!
//! Provides:
//! - Revision and sibling fetchers over the `IDocumentStore` port
//! - The merge invoker, which stamps the fresh revision token before merging
//! - The conflict resolution state machine with bounded fetch retry
//! - Built-in merge strategies (`incoming_wins`, `field_union`)

pub mod error;
pub mod fetcher;
pub mod invoker;
pub mod resolver;
pub mod strategies;

pub use error::ConflictError;
pub use fetcher::{fetch_all_siblings, fetch_revision_set, fetch_sibling};
pub use invoker::invoke_merge;
pub use resolver::{ConflictResolver, ResolutionReport, RetryPolicy};
pub use strategies::{merger_for, FieldUnionMerger, IncomingWinsMerger};

#[cfg(test)]
pub(crate) mod mock;
