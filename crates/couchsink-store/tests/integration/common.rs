//! Shared test helpers for store adapter integration tests
//!
//! Each helper returns a store adapter pointing at a fresh wiremock server.

use couchsink_core::domain::{DatabaseName, Document, DocumentId};
use couchsink_store::{CouchClient, CouchDocumentStore};
use wiremock::MockServer;

/// Authorization header value every test client sends
pub const AUTH: &str = "Basic YWRtaW46c2VjcmV0";

/// Starts a mock server and returns it with an authenticated store adapter
pub async fn setup_store_mock() -> (MockServer, CouchDocumentStore) {
    let server = MockServer::start().await;
    let client = CouchClient::new(&server.uri())
        .expect("valid mock server url")
        .with_authorization(AUTH)
        .expect("valid header");
    (server, CouchDocumentStore::new(client))
}

pub fn db(name: &str) -> DatabaseName {
    name.parse().expect("valid database name")
}

pub fn id(value: &str) -> DocumentId {
    value.parse().expect("valid document id")
}

pub fn doc(value: serde_json::Value) -> Document {
    Document::from_value(value).expect("valid document")
}
