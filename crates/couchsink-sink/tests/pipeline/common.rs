//! Shared helpers for pipeline tests

use couchsink_core::{config::ConfigBuilder, domain::IncomingRecord};
use couchsink_sink::SinkTask;
use serde_json::Value;
use wiremock::MockServer;

/// `Basic base64("admin:secret")`
pub const AUTH: &str = "Basic YWRtaW46c2VjcmV0";

pub const TOPIC: &str = "orders-v1";

/// Starts a mock store and a sink task routing [`TOPIC`] to `orders`
pub async fn setup_task(strategy: &str, max_retries: u32) -> (MockServer, SinkTask) {
    let server = MockServer::start().await;
    let config = ConfigBuilder::new()
        .store_url(server.uri())
        .store_credentials("admin", "secret")
        .topic(TOPIC, "orders")
        .merging_strategy(strategy)
        .max_conflicting_docs_fetch_retries(max_retries)
        .fetch_retry_backoff_ms(0)
        .build();

    let task = SinkTask::start(&config).expect("valid configuration");
    (server, task)
}

pub fn record(value: Value) -> IncomingRecord {
    IncomingRecord::new(TOPIC, value)
}
