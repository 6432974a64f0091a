//! Read requests: latest revision with conflicts, and a specific revision

use std::time::Duration;

use couchsink_core::domain::{Document, RevisionSet, WriteOutcome};
use couchsink_core::ports::IDocumentStore;
use couchsink_store::{CouchClient, CouchDocumentStore};
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, ResponseTemplate,
};

use crate::common::{self, db, id, AUTH};

#[tokio::test]
async fn test_get_with_conflicts_sends_query_and_auth() {
    let (server, store) = common::setup_store_mock().await;

    Mock::given(method("GET"))
        .and(path("/orders/d1"))
        .and(query_param("conflicts", "true"))
        .and(header("authorization", AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "_id": "d1",
            "_rev": "3-a",
            "_conflicts": ["2-b", "2-c"],
            "v": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = store
        .get_with_conflicts(&db("orders"), &id("d1"))
        .await
        .expect("request should complete");

    assert_eq!(response.status, 200);
    let WriteOutcome::Accepted(body) = response.classify() else {
        panic!("expected Accepted");
    };
    let set = RevisionSet::from_document(Document::from_json_str(&body).unwrap())
        .expect("valid revision set");
    assert_eq!(set.latest_revision().as_str(), "3-a");
    assert_eq!(set.conflict_revisions().len(), 2);
}

#[tokio::test]
async fn test_get_revision_sends_rev_query() {
    let (server, store) = common::setup_store_mock().await;

    Mock::given(method("GET"))
        .and(path("/orders/d1"))
        .and(query_param("rev", "2-b"))
        .and(header("authorization", AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "_id": "d1",
            "_rev": "2-b",
            "v": 7
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = store
        .get_revision(&db("orders"), &id("d1"), &"2-b".parse().unwrap())
        .await
        .expect("request should complete");

    assert_eq!(response.status, 200);
    assert!(response.body.contains("\"v\":7"));
}

#[tokio::test]
async fn test_not_found_is_returned_not_raised() {
    let (server, store) = common::setup_store_mock().await;

    Mock::given(method("GET"))
        .and(path("/orders/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": "not_found",
            "reason": "deleted"
        })))
        .mount(&server)
        .await;

    let response = store
        .get_with_conflicts(&db("orders"), &id("gone"))
        .await
        .expect("a 404 is still a response");

    assert_eq!(response.status, 404);
    assert_eq!(response.status_message, "Not Found");
    assert!(matches!(response.classify(), WriteOutcome::Failed(_)));
}

#[tokio::test]
async fn test_database_name_with_slash_is_one_segment() {
    let (server, store) = common::setup_store_mock().await;

    Mock::given(method("GET"))
        .and(path("/crm%2Fcustomers/c1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"_id": "c1", "_rev": "1-a"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = store
        .get_with_conflicts(&db("crm/customers"), &id("c1"))
        .await
        .expect("request should complete");
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_timeout_surfaces_as_error() {
    let server = wiremock::MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"_id": "d1", "_rev": "1-a"}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = CouchClient::with_timeouts(
        &server.uri(),
        Duration::from_millis(50),
        Duration::from_millis(50),
    )
    .unwrap();
    let store = CouchDocumentStore::new(client);

    let result = store.get_with_conflicts(&db("orders"), &id("d1")).await;
    let outcome = couchsink_core::domain::classify_result(result);
    match outcome {
        WriteOutcome::Failed(failure) => assert_eq!(failure.status, None),
        other => panic!("expected Failed, got {other:?}"),
    }
}
