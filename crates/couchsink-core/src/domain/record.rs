//! Records delivered by the upstream stream
//!
//! An [`IncomingRecord`] is owned by the stream collaborator and is read-only
//! to the pipeline. Partition and offset are carried purely so that failures
//! can be logged with enough context to replay the record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single record consumed from the message stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingRecord {
    /// Topic the record was published to (used for database routing)
    pub topic: String,
    /// Partition within the topic, if known
    #[serde(default)]
    pub partition: Option<i32>,
    /// Offset within the partition, if known
    #[serde(default)]
    pub offset: Option<i64>,
    /// Record key
    #[serde(default)]
    pub key: Option<Value>,
    /// Record payload
    pub value: Value,
    /// Producer or broker timestamp
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl IncomingRecord {
    /// Creates a record with only a topic and a payload
    pub fn new(topic: impl Into<String>, value: Value) -> Self {
        Self {
            topic: topic.into(),
            partition: None,
            offset: None,
            key: None,
            value,
            timestamp: None,
        }
    }

    /// Sets the record key
    pub fn with_key(mut self, key: Value) -> Self {
        self.key = Some(key);
        self
    }

    /// Sets the stream position
    pub fn with_position(mut self, partition: i32, offset: i64) -> Self {
        self.partition = Some(partition);
        self.offset = Some(offset);
        self
    }

    /// Returns `topic[partition]@offset` for log lines
    pub fn position(&self) -> String {
        match (self.partition, self.offset) {
            (Some(p), Some(o)) => format!("{}[{p}]@{o}", self.topic),
            (Some(p), None) => format!("{}[{p}]", self.topic),
            _ => self.topic.clone(),
        }
    }
}
