//! couchsink Store - HTTP client for the revision-controlled document store
//!
//! Provides:
//! - A thin authenticated HTTP client with request/connect timeouts
//! - The [`IDocumentStore`](couchsink_core::ports::IDocumentStore) adapter
//!   issuing the four requests the write pipeline needs
//!
//! ## Modules
//!
//! - [`client`] - Authenticated HTTP client and URL construction
//! - [`provider`] - `IDocumentStore` implementation

pub mod client;
pub mod provider;

pub use client::CouchClient;
pub use provider::CouchDocumentStore;

use thiserror::Error;

/// Errors raised by the store adapter before a response is available
#[derive(Debug, Error)]
pub enum StoreError {
    /// The configured base address is not a usable URL
    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),

    /// The configured authorization value cannot be sent as a header
    #[error("Invalid authorization header: {0}")]
    InvalidAuthorization(String),

    /// A network-level error occurred (connection failure, timeout, ...)
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}
