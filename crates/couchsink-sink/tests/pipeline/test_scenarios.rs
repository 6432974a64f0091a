//! Create and conflict-resolution paths

use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path, query_param},
    Mock, ResponseTemplate,
};

use crate::common::{self, record, AUTH};

fn created(id: &str, rev: &str) -> ResponseTemplate {
    ResponseTemplate::new(201).set_body_json(json!({"ok": true, "id": id, "rev": rev}))
}

fn conflict() -> ResponseTemplate {
    ResponseTemplate::new(409).set_body_json(json!({
        "error": "conflict",
        "reason": "Document update conflict."
    }))
}

#[tokio::test]
async fn test_scenario_a_create_into_empty_database() {
    let (server, task) = common::setup_task("field_union", 5).await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(header("authorization", AUTH))
        .and(body_json(json!({"_id": "d1", "v": 1})))
        .respond_with(created("d1", "1-a"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let summary = task.put(vec![record(json!({"_id": "d1", "v": 1}))]).await.unwrap();

    assert_eq!(summary.created, 1);
    assert_eq!(summary.merged, 0);
}

#[tokio::test]
async fn test_scenario_b_conflict_without_siblings() {
    let (server, task) = common::setup_task("field_union", 5).await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(conflict())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders/d1"))
        .and(query_param("conflicts", "true"))
        .and(header("authorization", AUTH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"_id": "d1", "_rev": "1-a", "v": 1})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orders/_bulk_docs"))
        .and(header("authorization", AUTH))
        .and(body_json(json!({"docs": [{"_id": "d1", "_rev": "1-a", "v": 2}]})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!([{"ok": true, "id": "d1", "rev": "2-m"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let summary = task.put(vec![record(json!({"_id": "d1", "v": 2}))]).await.unwrap();

    assert_eq!(summary.merged, 1);
}

#[tokio::test]
async fn test_scenario_c_siblings_are_superseded() {
    let (server, task) = common::setup_task("incoming_wins", 5).await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(conflict())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders/d1"))
        .and(query_param("conflicts", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "d1",
            "_rev": "3-a",
            "_conflicts": ["2-b", "2-c"],
            "v": 1
        })))
        .expect(1)
        .mount(&server)
        .await;
    for rev in ["2-b", "2-c"] {
        Mock::given(method("GET"))
            .and(path("/orders/d1"))
            .and(query_param("rev", rev))
            .and(header("authorization", AUTH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"_id": "d1", "_rev": rev, "v": rev})),
            )
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/orders/_bulk_docs"))
        .and(header("authorization", AUTH))
        .and(body_json(json!({"docs": [
            {"_id": "d1", "_rev": "3-a", "v": 2},
            {"_id": "d1", "_rev": "2-b", "_deleted": true},
            {"_id": "d1", "_rev": "2-c", "_deleted": true}
        ]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"ok": true, "id": "d1", "rev": "4-m"},
            {"ok": true, "id": "d1", "rev": "3-b"},
            {"ok": true, "id": "d1", "rev": "3-c"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let summary = task.put(vec![record(json!({"_id": "d1", "v": 2}))]).await.unwrap();

    assert_eq!(summary.merged, 1);
}

#[tokio::test]
async fn test_scenario_d_fetch_recovers_on_third_attempt() {
    let (server, task) = common::setup_task("field_union", 2).await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(conflict())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders/d1"))
        .and(query_param("conflicts", "true"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders/d1"))
        .and(query_param("conflicts", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"_id": "d1", "_rev": "1-a", "v": 1})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orders/_bulk_docs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"ok": true}])))
        .expect(1)
        .mount(&server)
        .await;

    let summary = task.put(vec![record(json!({"_id": "d1", "v": 2}))]).await.unwrap();

    assert_eq!(summary.merged, 1);
}

#[tokio::test]
async fn test_mixed_batch_in_order() {
    let (server, task) = common::setup_task("field_union", 0).await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(body_json(json!({"_id": "d2", "v": 1})))
        .respond_with(conflict())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(created("d1", "1-a"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders/d2"))
        .and(query_param("conflicts", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"_id": "d2", "_rev": "5-z"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orders/_bulk_docs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"ok": true}])))
        .mount(&server)
        .await;

    let summary = task
        .put(vec![
            record(json!({"_id": "d1", "v": 1})),
            record(json!({"_id": "d2", "v": 1})),
            record(json!({"_id": "d3", "v": 1})),
        ])
        .await
        .unwrap();

    assert_eq!(summary.created, 2);
    assert_eq!(summary.merged, 1);
    assert_eq!(summary.total(), 3);
}
