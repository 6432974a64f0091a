//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for the identifiers that flow through the write
//! pipeline. Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// DocumentId
// ============================================================================

/// Primary key of a document in the store (`_id`)
///
/// Any non-empty string is accepted, except that the leading underscore is
/// reserved by the store for its own prefixes (`_design/`, `_local/`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

/// Underscore prefixes the store accepts in document ids
const RESERVED_ID_PREFIXES: &[&str] = &["_design/", "_local/"];

impl DocumentId {
    /// Create a new DocumentId
    ///
    /// # Errors
    /// Returns error if the id is empty or uses a reserved underscore prefix
    pub fn new(id: String) -> Result<Self, DomainError> {
        if id.is_empty() {
            return Err(DomainError::InvalidDocumentId(
                "Document id cannot be empty".to_string(),
            ));
        }

        if id.starts_with('_') && !RESERVED_ID_PREFIXES.iter().any(|p| id.starts_with(p)) {
            return Err(DomainError::InvalidDocumentId(format!(
                "Document id must not start with an underscore: {id}"
            )));
        }

        Ok(Self(id))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for DocumentId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

// ============================================================================
// Revision
// ============================================================================

/// Revision token (`_rev`) attached to a stored document
///
/// Format: `{generation}-{hash}`, e.g. `"1-967a00dff5e02add41819138abb3284d"`.
/// The token is opaque to the pipeline; only its shape is checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Revision(String);

impl Revision {
    /// Create a new Revision
    ///
    /// # Errors
    /// Returns error if the token is not of the form `{generation}-{hash}`
    pub fn new(rev: String) -> Result<Self, DomainError> {
        let Some((generation, hash)) = rev.split_once('-') else {
            return Err(DomainError::InvalidRevision(format!(
                "Revision must have the form <generation>-<hash>: {rev}"
            )));
        };

        if generation.is_empty() || !generation.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::InvalidRevision(format!(
                "Revision generation must be numeric: {rev}"
            )));
        }

        if hash.is_empty() {
            return Err(DomainError::InvalidRevision(format!(
                "Revision hash cannot be empty: {rev}"
            )));
        }

        Ok(Self(rev))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Revision {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Revision {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for Revision {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Revision> for String {
    fn from(rev: Revision) -> Self {
        rev.0
    }
}

// ============================================================================
// DatabaseName
// ============================================================================

/// Name of a database in the store
///
/// Must match `^[a-z][a-z0-9_$()+/-]*$`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatabaseName(String);

impl DatabaseName {
    /// Create a new DatabaseName
    ///
    /// # Errors
    /// Returns error if the name does not satisfy the store's naming rule
    pub fn new(name: String) -> Result<Self, DomainError> {
        let mut chars = name.chars();

        match chars.next() {
            Some(c) if c.is_ascii_lowercase() => {}
            _ => {
                return Err(DomainError::InvalidDatabaseName(format!(
                    "Database name must start with a lowercase letter: {name:?}"
                )))
            }
        }

        if !chars.all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || "_$()+-/".contains(c)
        }) {
            return Err(DomainError::InvalidDatabaseName(format!(
                "Database name contains invalid characters: {name}"
            )));
        }

        Ok(Self(name))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DatabaseName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DatabaseName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for DatabaseName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<DatabaseName> for String {
    fn from(name: DatabaseName) -> Self {
        name.0
    }
}
