//! Record converter port
//!
//! Turns the payload of an [`IncomingRecord`] into the generic document shape.
//! The converter does not have to guarantee an `_id`; the pipeline checks for
//! it separately so that "unconvertible payload" and "payload without id" are
//! reported as distinct errors.

use serde_json::{Map, Value};

use crate::domain::IncomingRecord;

/// Converts stream records into JSON objects
pub trait IConverter: Send + Sync {
    /// Converts a record payload into a JSON object
    ///
    /// # Errors
    /// Returns an error if the record cannot be represented as a document
    fn from_record(&self, record: &IncomingRecord) -> anyhow::Result<Map<String, Value>>;
}
