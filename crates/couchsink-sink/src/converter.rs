//! Default record converter
//!
//! Record payloads are expected to be JSON objects. Optionally, a record
//! whose payload has no `_id` takes its id from the record key.

use serde_json::{Map, Value};
use tracing::trace;

use couchsink_core::{
    domain::{IncomingRecord, ID_FIELD},
    ports::IConverter,
};

/// Converts JSON object payloads into documents
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConverter {
    id_from_key: bool,
}

impl JsonConverter {
    pub fn new(id_from_key: bool) -> Self {
        Self { id_from_key }
    }
}

impl IConverter for JsonConverter {
    fn from_record(&self, record: &IncomingRecord) -> anyhow::Result<Map<String, Value>> {
        let mut fields = match &record.value {
            Value::Object(map) => map.clone(),
            Value::String(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                _ => anyhow::bail!("string payload is not a JSON object"),
            },
            Value::Null => anyhow::bail!("payload is empty"),
            _ => anyhow::bail!("payload is not a JSON object"),
        };

        if self.id_from_key && !fields.contains_key(ID_FIELD) {
            match &record.key {
                Some(Value::String(key)) => {
                    trace!(key = %key, "Using record key as document id");
                    fields.insert(ID_FIELD.to_string(), Value::String(key.clone()));
                }
                Some(Value::Number(key)) => {
                    fields.insert(ID_FIELD.to_string(), Value::String(key.to_string()));
                }
                _ => {}
            }
        }

        Ok(fields)
    }
}
