//! Scripted in-memory document store used by the unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use couchsink_core::domain::{DatabaseName, Document, DocumentId, Revision, StoreResponse};
use couchsink_core::ports::IDocumentStore;
use serde_json::Value;

/// Store fake that replays scripted responses and records every call
///
/// `get_with_conflicts` pops from a script and falls back to a default once
/// the script is drained; sibling reads are keyed by revision.
pub(crate) struct MockStore {
    latest_script: Mutex<VecDeque<anyhow::Result<StoreResponse>>>,
    latest_default: StoreResponse,
    siblings: HashMap<String, StoreResponse>,
    insert_response: StoreResponse,
    bulk_response: StoreResponse,
    calls: Mutex<Vec<String>>,
    written: Mutex<Vec<Vec<Document>>>,
}

pub(crate) fn ok(body: Value) -> StoreResponse {
    StoreResponse::new(200, "OK", body.to_string())
}

pub(crate) fn status(code: u16, reason: &str) -> StoreResponse {
    StoreResponse::new(code, reason, r#"{"error":"x"}"#)
}

pub(crate) fn doc(value: Value) -> Document {
    Document::from_value(value).expect("valid document")
}

impl MockStore {
    pub(crate) fn new() -> Self {
        Self {
            latest_script: Mutex::new(VecDeque::new()),
            latest_default: status(404, "Not Found"),
            siblings: HashMap::new(),
            insert_response: StoreResponse::new(
                201,
                "Created",
                r#"{"ok":true,"id":"d1","rev":"1-a"}"#,
            ),
            bulk_response: StoreResponse::new(201, "Created", r#"[{"ok":true,"id":"d1"}]"#),
            calls: Mutex::new(Vec::new()),
            written: Mutex::new(Vec::new()),
        }
    }

    /// Every `get_with_conflicts` answers with this body unless scripted
    pub(crate) fn with_latest(mut self, body: Value) -> Self {
        self.latest_default = ok(body);
        self
    }

    /// Every unscripted `get_with_conflicts` answers with this response
    pub(crate) fn with_latest_response(mut self, response: StoreResponse) -> Self {
        self.latest_default = response;
        self
    }

    /// Queues a one-shot `get_with_conflicts` result
    pub(crate) fn script_latest(self, result: anyhow::Result<StoreResponse>) -> Self {
        self.latest_script.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn with_sibling(mut self, rev: &str, response: StoreResponse) -> Self {
        self.siblings.insert(rev.to_string(), response);
        self
    }

    pub(crate) fn with_bulk_response(mut self, response: StoreResponse) -> Self {
        self.bulk_response = response;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub(crate) fn written(&self) -> Vec<Vec<Document>> {
        self.written.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl IDocumentStore for MockStore {
    async fn get_with_conflicts(
        &self,
        database: &DatabaseName,
        id: &DocumentId,
    ) -> anyhow::Result<StoreResponse> {
        self.record(format!("latest {database}/{id}"));
        match self.latest_script.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(self.latest_default.clone()),
        }
    }

    async fn get_revision(
        &self,
        database: &DatabaseName,
        id: &DocumentId,
        rev: &Revision,
    ) -> anyhow::Result<StoreResponse> {
        self.record(format!("rev {database}/{id}@{rev}"));
        Ok(self
            .siblings
            .get(rev.as_str())
            .cloned()
            .unwrap_or_else(|| status(404, "Not Found")))
    }

    async fn insert(&self, database: &DatabaseName, doc: &Document) -> anyhow::Result<StoreResponse> {
        self.record(format!("insert {database}/{}", doc.id()));
        Ok(self.insert_response.clone())
    }

    async fn bulk_docs(
        &self,
        database: &DatabaseName,
        docs: &[Document],
    ) -> anyhow::Result<StoreResponse> {
        self.record(format!("bulk {database} {}", docs.len()));
        self.written.lock().unwrap().push(docs.to_vec());
        Ok(self.bulk_response.clone())
    }
}
