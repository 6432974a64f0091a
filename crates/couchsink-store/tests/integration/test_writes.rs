//! Write requests: create and bulk write-back

use couchsink_core::domain::WriteOutcome;
use couchsink_core::ports::IDocumentStore;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, ResponseTemplate,
};

use crate::common::{self, db, doc, AUTH};

#[tokio::test]
async fn test_insert_posts_document() {
    let (server, store) = common::setup_store_mock().await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(header("authorization", AUTH))
        .and(body_json(serde_json::json!({"_id": "d1", "v": 1})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "ok": true,
            "id": "d1",
            "rev": "1-a"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = store
        .insert(&db("orders"), &doc(serde_json::json!({"_id": "d1", "v": 1})))
        .await
        .expect("request should complete");

    assert_eq!(response.status, 201);
    assert!(response.classify().is_accepted());
}

#[tokio::test]
async fn test_insert_conflict_is_classified() {
    let (server, store) = common::setup_store_mock().await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "error": "conflict",
            "reason": "Document update conflict."
        })))
        .mount(&server)
        .await;

    let response = store
        .insert(&db("orders"), &doc(serde_json::json!({"_id": "d1", "v": 2})))
        .await
        .expect("request should complete");

    assert_eq!(response.classify(), WriteOutcome::Conflict);
}

#[tokio::test]
async fn test_bulk_docs_wraps_batch_and_sends_auth() {
    let (server, store) = common::setup_store_mock().await;

    let merged = doc(serde_json::json!({"_id": "d1", "_rev": "3-a", "v": 2}));
    let tomb = doc(serde_json::json!({"_id": "d1", "_rev": "2-b"}))
        .tombstone()
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/orders/_bulk_docs"))
        .and(header("authorization", AUTH))
        .and(body_json(serde_json::json!({
            "docs": [
                {"_id": "d1", "_rev": "3-a", "v": 2},
                {"_id": "d1", "_rev": "2-b", "_deleted": true}
            ]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([
            {"ok": true, "id": "d1", "rev": "4-m"},
            {"ok": true, "id": "d1", "rev": "3-t"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let response = store
        .bulk_docs(&db("orders"), &[merged, tomb])
        .await
        .expect("request should complete");

    assert!(response.classify_bulk().is_accepted());
}

#[tokio::test]
async fn test_empty_success_body_is_failed() {
    let (server, store) = common::setup_store_mock().await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let response = store
        .insert(&db("orders"), &doc(serde_json::json!({"_id": "d1"})))
        .await
        .expect("request should complete");

    assert!(matches!(response.classify(), WriteOutcome::Failed(_)));
}
