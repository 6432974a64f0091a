//! Domain layer
//!
//! Pure data types and rules shared by every stage of the write pipeline.
//! Nothing in here performs I/O.
//!
//! ## Modules
//!
//! - [`document`] - The generic document shape and its reserved fields
//! - [`errors`] - Domain validation errors
//! - [`newtypes`] - Validated identifiers (`DocumentId`, `Revision`, `DatabaseName`)
//! - [`outcome`] - Store responses and the response classifier
//! - [`record`] - Records delivered by the upstream stream
//! - [`revision`] - Revision sets, conflict bundles and merge batches

pub mod document;
pub mod errors;
pub mod newtypes;
pub mod outcome;
pub mod record;
pub mod revision;

pub use document::{Document, CONFLICTS_FIELD, DELETED_FIELD, ID_FIELD, REV_FIELD};
pub use errors::DomainError;
pub use newtypes::{DatabaseName, DocumentId, Revision};
pub use outcome::{
    classify, classify_result, inspect_bulk_results, StoreFailure, StoreResponse, WriteOutcome,
    CONFLICT_STATUS_CODE,
};
pub use record::IncomingRecord;
pub use revision::{ConflictBundle, MergeDraft, MergeResult, RevisionSet};
