//! Integration tests for couchsink-store
//!
//! Uses wiremock to simulate the document store and verifies the requests
//! issued by the CouchDocumentStore adapter and how their responses are
//! captured.

mod common;

mod test_reads;
mod test_writes;
