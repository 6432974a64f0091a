//! CouchDocumentStore - IDocumentStore implementation over HTTP
//!
//! Maps the four port operations onto the store's REST endpoints:
//!
//! | Operation            | Request                                   |
//! |----------------------|-------------------------------------------|
//! | `get_with_conflicts` | `GET /{db}/{id}?conflicts=true`           |
//! | `get_revision`       | `GET /{db}/{id}?rev={rev}`                |
//! | `insert`             | `POST /{db}` with the document            |
//! | `bulk_docs`          | `POST /{db}/_bulk_docs` with `{"docs":[..]}` |

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use tracing::debug;

use couchsink_core::domain::{DatabaseName, Document, DocumentId, Revision, StoreResponse};
use couchsink_core::ports::IDocumentStore;

use crate::client::CouchClient;

/// Document store adapter backed by [`CouchClient`]
#[derive(Debug, Clone)]
pub struct CouchDocumentStore {
    client: CouchClient,
}

impl CouchDocumentStore {
    /// Creates a new store adapter wrapping the given client
    pub fn new(client: CouchClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client
    pub fn client(&self) -> &CouchClient {
        &self.client
    }
}

#[async_trait]
impl IDocumentStore for CouchDocumentStore {
    async fn get_with_conflicts(
        &self,
        database: &DatabaseName,
        id: &DocumentId,
    ) -> anyhow::Result<StoreResponse> {
        debug!(database = %database, doc_id = %id, "Fetching latest revision with conflicts");

        let mut url = self.client.url_for(&[database.as_str(), id.as_str()]);
        url.query_pairs_mut().append_pair("conflicts", "true");

        self.client
            .execute(self.client.request(Method::GET, url))
            .await
            .with_context(|| format!("GET {database}/{id}?conflicts=true failed"))
    }

    async fn get_revision(
        &self,
        database: &DatabaseName,
        id: &DocumentId,
        rev: &Revision,
    ) -> anyhow::Result<StoreResponse> {
        debug!(database = %database, doc_id = %id, rev = %rev, "Fetching conflict revision");

        let mut url = self.client.url_for(&[database.as_str(), id.as_str()]);
        url.query_pairs_mut().append_pair("rev", rev.as_str());

        self.client
            .execute(self.client.request(Method::GET, url))
            .await
            .with_context(|| format!("GET {database}/{id}?rev={rev} failed"))
    }

    async fn insert(
        &self,
        database: &DatabaseName,
        doc: &Document,
    ) -> anyhow::Result<StoreResponse> {
        debug!(database = %database, doc_id = %doc.id(), "Inserting document");

        let url = self.client.url_for(&[database.as_str()]);

        self.client
            .execute(self.client.request(Method::POST, url).json(doc))
            .await
            .with_context(|| format!("POST {database} failed"))
    }

    async fn bulk_docs(
        &self,
        database: &DatabaseName,
        docs: &[Document],
    ) -> anyhow::Result<StoreResponse> {
        debug!(database = %database, count = docs.len(), "Writing bulk documents");

        let url = self.client.url_for(&[database.as_str(), "_bulk_docs"]);
        let body = json!({ "docs": docs });

        self.client
            .execute(self.client.request(Method::POST, url).json(&body))
            .await
            .with_context(|| format!("POST {database}/_bulk_docs failed"))
    }
}
