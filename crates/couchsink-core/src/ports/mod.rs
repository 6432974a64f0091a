//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the traits the pipeline depends on; their implementations live
//! in adapter crates or are injected by the host.
//!
//! ## Ports Overview
//!
//! - [`IDocumentStore`] - Reads and writes against the revision-controlled store
//! - [`IConverter`] - Turns stream records into generic JSON objects
//! - [`IMerger`] - Pluggable strategy reconciling conflicting revisions

pub mod converter;
pub mod document_store;
pub mod merger;

pub use converter::IConverter;
pub use document_store::IDocumentStore;
pub use merger::IMerger;
