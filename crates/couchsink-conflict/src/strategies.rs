//! Built-in merge strategies
//!
//! | Name            | Merged document                                         |
//! |-----------------|---------------------------------------------------------|
//! | `incoming_wins` | the incoming document as-is                             |
//! | `field_union`   | latest body, plus fields only siblings have, overlaid   |
//! |                 | with the incoming document's fields                     |
//!
//! Both supersede every sibling revision.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::trace;

use couchsink_core::{
    domain::{Document, MergeDraft},
    ports::IMerger,
};

use crate::error::ConflictError;

/// Last-writer-wins: the incoming document replaces everything
#[derive(Debug, Default, Clone, Copy)]
pub struct IncomingWinsMerger;

impl IMerger for IncomingWinsMerger {
    fn name(&self) -> &str {
        "incoming_wins"
    }

    fn merge(
        &self,
        incoming: Document,
        _latest: &Document,
        conflicts: &[Document],
    ) -> anyhow::Result<MergeDraft> {
        Ok(MergeDraft {
            merged: incoming,
            superseded: conflicts.to_vec(),
        })
    }
}

/// Field-level union of the latest body, the siblings and the incoming write
///
/// Precedence, highest first: incoming, latest, siblings in store order.
/// Nested objects are merged key by key. Reserved `_`-prefixed members of
/// siblings are never copied.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldUnionMerger;

impl IMerger for FieldUnionMerger {
    fn name(&self) -> &str {
        "field_union"
    }

    fn merge(
        &self,
        incoming: Document,
        latest: &Document,
        conflicts: &[Document],
    ) -> anyhow::Result<MergeDraft> {
        let mut merged = latest.fields().clone();

        for sibling in conflicts {
            fill_missing(&mut merged, sibling.fields(), true);
        }
        overlay(&mut merged, incoming.fields());

        trace!(doc_id = %incoming.id(), fields = merged.len(), "Field union merged");

        Ok(MergeDraft {
            merged: Document::from_map(merged)?,
            superseded: conflicts.to_vec(),
        })
    }
}

/// Copies keys from `source` that `target` lacks, descending into objects
fn fill_missing(target: &mut Map<String, Value>, source: &Map<String, Value>, top_level: bool) {
    for (key, value) in source {
        if top_level && key.starts_with('_') {
            continue;
        }
        match target.get_mut(key) {
            None => {
                target.insert(key.clone(), value.clone());
            }
            Some(Value::Object(existing)) => {
                if let Value::Object(nested) = value {
                    fill_missing(existing, nested, false);
                }
            }
            Some(_) => {}
        }
    }
}

/// Writes every key of `source` into `target`, merging nested objects
fn overlay(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        if let (Some(Value::Object(existing)), Value::Object(nested)) = (target.get_mut(key), value)
        {
            overlay(existing, nested);
            continue;
        }
        target.insert(key.clone(), value.clone());
    }
}

/// Parses a strategy name into a merger
fn parse_strategy(name: &str) -> Option<Arc<dyn IMerger>> {
    match name {
        "incoming_wins" => Some(Arc::new(IncomingWinsMerger)),
        "field_union" => Some(Arc::new(FieldUnionMerger)),
        _ => None,
    }
}

/// Returns the built-in merger registered under `name`
///
/// # Errors
/// Returns [`ConflictError::UnknownStrategy`] for an unrecognized name
pub fn merger_for(name: &str) -> Result<Arc<dyn IMerger>, ConflictError> {
    parse_strategy(name).ok_or_else(|| ConflictError::UnknownStrategy(name.to_string()))
}
