//! Fatal paths: exhausted retries, rejected writes, transport errors

use std::time::Duration;

use couchsink_core::config::ConfigBuilder;
use couchsink_sink::{SinkError, SinkTask};
use serde_json::json;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use crate::common::{self, record};

#[tokio::test]
async fn test_scenario_e_retries_exhausted_after_two_attempts() {
    let (server, task) = common::setup_task("field_union", 1).await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders/d1"))
        .and(query_param("conflicts", "true"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orders/_bulk_docs"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let err = task
        .put(vec![record(json!({"_id": "d1", "v": 2}))])
        .await
        .unwrap_err();

    match err {
        SinkError::Resolution { source, .. } => {
            assert!(source.is_retries_exhausted());
            assert_eq!(source.status(), Some(500));
        }
        other => panic!("expected Resolution, got {other:?}"),
    }
}

#[tokio::test]
async fn test_write_back_conflict_is_fatal() {
    let (server, task) = common::setup_task("field_union", 5).await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders/d1"))
        .and(query_param("conflicts", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"_id": "d1", "_rev": "1-a"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orders/_bulk_docs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": "d1", "error": "conflict", "reason": "Document update conflict."}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let err = task
        .put(vec![record(json!({"_id": "d1"}))])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SinkError::Resolution {
            source: couchsink_conflict::ConflictError::WriteConflict { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_rejected_create_aborts_remaining_records() {
    let (server, task) = common::setup_task("field_union", 5).await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "forbidden"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = task
        .put(vec![record(json!({"_id": "d1"})), record(json!({"_id": "d2"}))])
        .await
        .unwrap_err();

    assert!(matches!(err, SinkError::InsertRejected { .. }));
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn test_store_timeout_is_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"ok": true}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = ConfigBuilder::new()
        .store_url(server.uri())
        .store_request_timeout_secs(1)
        .topic(common::TOPIC, "orders")
        .build();
    let task = SinkTask::start(&config).unwrap();

    let err = task
        .put(vec![record(json!({"_id": "d1"}))])
        .await
        .unwrap_err();

    match err {
        SinkError::InsertRejected { failure, .. } => assert_eq!(failure.status, None),
        other => panic!("expected InsertRejected, got {other:?}"),
    }
}
