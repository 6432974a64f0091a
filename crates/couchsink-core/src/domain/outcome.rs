//! Store responses and their classification
//!
//! Every response coming back from the document store, whether for a read or
//! a write, is reduced to a [`WriteOutcome`] by the same pure classifier:
//!
//! | Status                         | Body      | Outcome     |
//! |--------------------------------|-----------|-------------|
//! | 409                            | any       | `Conflict`  |
//! | 200..=399                      | non-empty | `Accepted`  |
//! | 200..=399                      | empty     | `Failed`    |
//! | anything else                  | any       | `Failed`    |
//!
//! A successful status with an empty body is a protocol violation: later
//! stages need the body (it carries the revision token).

use std::fmt::{self, Display, Formatter};

use serde_json::Value;

/// Status code the store uses to report a revision conflict
pub const CONFLICT_STATUS_CODE: u16 = 409;

/// A raw response from the document store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreResponse {
    /// HTTP status code
    pub status: u16,
    /// Reason phrase accompanying the status (e.g. "Conflict")
    pub status_message: String,
    /// Response body, possibly empty
    pub body: String,
}

impl StoreResponse {
    /// Creates a response value
    pub fn new(status: u16, status_message: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            status_message: status_message.into(),
            body: body.into(),
        }
    }

    /// Classifies this response, keeping the reason phrase for diagnostics
    pub fn classify(&self) -> WriteOutcome {
        match classify(self.status, &self.body) {
            WriteOutcome::Failed(mut failure) if !self.status_message.is_empty() => {
                failure.message = format!("{} ({})", failure.message, self.status_message);
                WriteOutcome::Failed(failure)
            }
            outcome => outcome,
        }
    }

    /// Classifies the response to a bulk write, then checks each
    /// per-document result of an accepted batch
    pub fn classify_bulk(&self) -> WriteOutcome {
        match self.classify() {
            WriteOutcome::Accepted(body) => inspect_bulk_results(self.status, &body),
            outcome => outcome,
        }
    }
}

/// Diagnostic payload of a failed store interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFailure {
    /// HTTP status, or `None` when the request never produced a response
    pub status: Option<u16>,
    /// Human-readable description
    pub message: String,
    /// Response body, if any
    pub body: String,
}

impl StoreFailure {
    /// Failure that happened before a response was received
    /// (connection refused, timeout expiry, ...)
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            body: String::new(),
        }
    }

    /// Failure reported by the store through its response
    pub fn protocol(status: u16, message: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            body: body.into(),
        }
    }
}

impl Display for StoreFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) if self.body.is_empty() => write!(f, "{} [status {status}]", self.message),
            Some(status) => write!(f, "{} [status {status}]: {}", self.message, self.body),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Result of a store interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The store accepted the request; carries the non-empty response body
    Accepted(String),
    /// The store rejected the write because of a revision conflict
    Conflict,
    /// Any other failure
    Failed(StoreFailure),
}

impl WriteOutcome {
    /// Returns true for [`WriteOutcome::Accepted`]
    pub fn is_accepted(&self) -> bool {
        matches!(self, WriteOutcome::Accepted(_))
    }
}

/// Classifies a store response
///
/// Pure function; used identically for the create attempt, the conflict
/// reads and the merge write-back.
pub fn classify(status: u16, body: &str) -> WriteOutcome {
    if status == CONFLICT_STATUS_CODE {
        return WriteOutcome::Conflict;
    }

    if !(200..400).contains(&status) {
        return WriteOutcome::Failed(StoreFailure::protocol(
            status,
            "Response contained error status",
            body,
        ));
    }

    if body.is_empty() {
        return WriteOutcome::Failed(StoreFailure::protocol(status, "empty body", ""));
    }

    WriteOutcome::Accepted(body.to_string())
}

/// Classifies the result of a store call, mapping transport errors to `Failed`
pub fn classify_result(result: anyhow::Result<StoreResponse>) -> WriteOutcome {
    match result {
        Ok(response) => response.classify(),
        Err(e) => WriteOutcome::Failed(StoreFailure::transport(format!("{e:#}"))),
    }
}

/// Inspects the per-document results of an accepted bulk write
///
/// The store answers a bulk write with one entry per submitted document. A
/// status-level success can still hide per-document rejections, so the batch
/// only counts as accepted when no entry carries an `error`. A `conflict`
/// entry yields [`WriteOutcome::Conflict`]; any other error yields `Failed`.
pub fn inspect_bulk_results(status: u16, body: &str) -> WriteOutcome {
    let entries = match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) | Err(_) => {
            return WriteOutcome::Failed(StoreFailure::protocol(
                status,
                "malformed bulk write response",
                body,
            ))
        }
    };

    let mut failure: Option<StoreFailure> = None;
    for entry in &entries {
        let Some(error) = entry.get("error").and_then(Value::as_str) else {
            continue;
        };
        if error == "conflict" {
            return WriteOutcome::Conflict;
        }
        if failure.is_none() {
            let id = entry.get("id").and_then(Value::as_str).unwrap_or("?");
            let reason = entry.get("reason").and_then(Value::as_str).unwrap_or("");
            failure = Some(StoreFailure::protocol(
                status,
                format!("bulk write rejected document {id}: {error} {reason}")
                    .trim_end()
                    .to_string(),
                body,
            ));
        }
    }

    match failure {
        Some(failure) => WriteOutcome::Failed(failure),
        None => WriteOutcome::Accepted(body.to_string()),
    }
}
