//! End-to-end tests for couchsink-sink
//!
//! Starts a `SinkTask` against a wiremock server standing in for the
//! document store and drives whole batches through it.

mod common;

mod test_failures;
mod test_scenarios;
