//! Generic document shape
//!
//! A [`Document`] is a JSON object that is guaranteed to carry a valid `_id`.
//! The id is captured at construction and cannot be changed afterwards; every
//! other field, including the reserved `_rev`, `_conflicts` and `_deleted`
//! members, is freely editable.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::DomainError;
use super::newtypes::{DocumentId, Revision};

/// Field holding the document's primary key
pub const ID_FIELD: &str = "_id";
/// Field holding the document's revision token
pub const REV_FIELD: &str = "_rev";
/// Field listing sibling conflict revisions (present on `?conflicts=true` reads)
pub const CONFLICTS_FIELD: &str = "_conflicts";
/// Field marking a revision as deleted in a bulk write
pub const DELETED_FIELD: &str = "_deleted";

/// A JSON document with an immutable `_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Document {
    id: DocumentId,
    fields: Map<String, Value>,
}

impl Document {
    /// Builds a document from a JSON object
    ///
    /// # Errors
    /// Returns error if `_id` is missing, not a string, or not a valid id
    pub fn from_map(fields: Map<String, Value>) -> Result<Self, DomainError> {
        let id = match fields.get(ID_FIELD) {
            Some(Value::String(s)) => DocumentId::new(s.clone())?,
            Some(other) => {
                return Err(DomainError::InvalidDocumentId(format!(
                    "`{ID_FIELD}` must be a string, got {other}"
                )))
            }
            None => {
                return Err(DomainError::InvalidDocumentId(format!(
                    "document has no `{ID_FIELD}` field"
                )))
            }
        };

        Ok(Self { id, fields })
    }

    /// Builds a document from any JSON value
    ///
    /// # Errors
    /// Returns error if the value is not an object or has no valid `_id`
    pub fn from_value(value: Value) -> Result<Self, DomainError> {
        match value {
            Value::Object(map) => Self::from_map(map),
            other => Err(DomainError::InvalidDocument(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Parses a document from a JSON response body
    ///
    /// # Errors
    /// Returns error if the body is not valid JSON or not a valid document
    pub fn from_json_str(body: &str) -> Result<Self, DomainError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| DomainError::InvalidDocument(format!("malformed JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Returns the document id
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Returns the revision token, if the document carries a valid one
    pub fn revision(&self) -> Option<Revision> {
        self.fields
            .get(REV_FIELD)
            .and_then(Value::as_str)
            .and_then(|s| Revision::new(s.to_string()).ok())
    }

    /// Stamps the document with the given revision token
    pub fn set_revision(&mut self, rev: &Revision) {
        self.fields
            .insert(REV_FIELD.to_string(), Value::String(rev.as_str().to_string()));
    }

    /// Returns the sibling conflict revisions listed in `_conflicts`
    ///
    /// A missing field means there are no siblings.
    ///
    /// # Errors
    /// Returns error if the field is not an array of revision tokens
    pub fn conflicts(&self) -> Result<Vec<Revision>, DomainError> {
        match self.fields.get(CONFLICTS_FIELD) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Revision::new(s.clone()),
                    other => Err(DomainError::InvalidRevision(format!(
                        "`{CONFLICTS_FIELD}` entries must be strings, got {other}"
                    ))),
                })
                .collect(),
            Some(other) => Err(DomainError::InvalidDocument(format!(
                "`{CONFLICTS_FIELD}` must be an array, got {}",
                json_type_name(other)
            ))),
        }
    }

    /// Returns true if the document is marked deleted
    pub fn is_deleted(&self) -> bool {
        matches!(self.fields.get(DELETED_FIELD), Some(Value::Bool(true)))
    }

    /// Returns a field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Sets a field value
    ///
    /// # Errors
    /// Returns [`DomainError::ImmutableId`] when trying to change `_id`
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Result<(), DomainError> {
        let key = key.into();
        if key == ID_FIELD && value.as_str() != Some(self.id.as_str()) {
            return Err(DomainError::ImmutableId {
                current: self.id.to_string(),
                attempted: value.to_string(),
            });
        }
        self.fields.insert(key, value);
        Ok(())
    }

    /// Removes a field and returns its previous value
    ///
    /// `_id` cannot be removed; asking for it returns `None`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        if key == ID_FIELD {
            return None;
        }
        self.fields.remove(key)
    }

    /// Returns all fields, including the reserved ones
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Builds the removal marker for this revision: `{_id, _rev, _deleted: true}`
    ///
    /// # Errors
    /// Returns error if the document carries no revision token
    pub fn tombstone(&self) -> Result<Document, DomainError> {
        let rev = self.revision().ok_or_else(|| {
            DomainError::InvalidRevision(format!(
                "cannot supersede document {} without a revision",
                self.id
            ))
        })?;

        let mut fields = Map::new();
        fields.insert(ID_FIELD.to_string(), Value::String(self.id.to_string()));
        fields.insert(REV_FIELD.to_string(), Value::String(rev.into()));
        fields.insert(DELETED_FIELD.to_string(), Value::Bool(true));

        Ok(Self {
            id: self.id.clone(),
            fields,
        })
    }

    /// Pretty-printed JSON, for diagnostics
    pub fn to_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.fields).unwrap_or_default()
    }
}

impl TryFrom<Map<String, Value>> for Document {
    type Error = DomainError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        Self::from_map(map)
    }
}

impl TryFrom<Value> for Document {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Document> for Map<String, Value> {
    fn from(doc: Document) -> Self {
        doc.fields
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.fields)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
