//! couchsink Sink - Per-record write pipeline
//!
//! Hosts the [`SinkTask`]: routes each incoming record to its database,
//! converts it to a document, attempts a create and hands conflicts to the
//! resolver. A batch call returns only once every write has been accepted
//! or the first fatal error has been reported.

pub mod converter;
pub mod error;
pub mod router;
pub mod task;

pub use converter::JsonConverter;
pub use error::SinkError;
pub use router::TopicRouter;
pub use task::{BatchSummary, SinkTask, TaskSettings};
