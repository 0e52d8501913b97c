//! # Content Client Layer
//!
//! bulkops never owns documents. Everything it reads or writes goes through a
//! [`ContentClient`], the host's already-authenticated handle on the content
//! store. The trait keeps the bulk logic decoupled from where documents live.
//!
//! ## Implementations
//!
//! - [`fs::FileClient`]: a dataset on disk
//!   - All documents in `dataset.json` (JSON array, insertion order)
//!   - Rewritten after every commit or create
//!
//! - [`memory::InMemoryClient`]: in-memory dataset for testing
//!   - No persistence
//!   - Failure injection for exercising partial-failure paths
//!
//! Both answer queries through the small local evaluator in [`query`]. A
//! remote host would evaluate queries itself; bulkops only ever hands it the
//! query string.
//!
//! ## Storage Format
//!
//! For `FileClient`:
//! ```text
//! .bulkops/
//! ├── dataset.json    # Every document (JSON array)
//! └── config.json     # Bulk operation settings
//! ```

use crate::error::{BulkError, Result};
use crate::model::{Patch, ID_FIELD, TYPE_FIELD};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

pub mod fs;
pub mod memory;
pub mod query;

pub const CREATED_AT_FIELD: &str = "_createdAt";
pub const UPDATED_AT_FIELD: &str = "_updatedAt";

/// The host content store, as seen by bulkops.
///
/// Each call is independent and may fail on its own; implementations are
/// expected to serialize their own I/O.
pub trait ContentClient {
    /// Evaluate a query expression and return the raw matching documents.
    fn fetch(&self, query: &str) -> Result<Vec<Value>>;

    /// Apply a partial update to one document.
    fn commit(&mut self, patch: &Patch) -> Result<()>;

    /// Insert one new document and return it as stored.
    fn create(&mut self, document: Map<String, Value>) -> Result<Value>;
}

impl<C: ContentClient + ?Sized> ContentClient for &mut C {
    fn fetch(&self, query: &str) -> Result<Vec<Value>> {
        (**self).fetch(query)
    }

    fn commit(&mut self, patch: &Patch) -> Result<()> {
        (**self).commit(patch)
    }

    fn create(&mut self, document: Map<String, Value>) -> Result<Value> {
        (**self).create(document)
    }
}

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Applies a patch to a document list in place.
pub(crate) fn apply_patch(documents: &mut [Value], patch: &Patch) -> Result<()> {
    let doc = documents
        .iter_mut()
        .find(|d| d.get(ID_FIELD).and_then(Value::as_str) == Some(patch.id.as_str()))
        .ok_or_else(|| BulkError::NotFound(patch.id.clone()))?;

    let Value::Object(map) = doc else {
        return Err(BulkError::Content(format!(
            "document {} is not an object",
            patch.id
        )));
    };

    // All-or-nothing: a failing assignment leaves the stored document untouched.
    let mut updated = map.clone();
    for (path, value) in &patch.set {
        set_path(&mut updated, path, value.clone())?;
    }
    updated.insert(UPDATED_AT_FIELD.to_string(), Value::String(now_stamp()));
    *map = updated;
    Ok(())
}

/// Sets `seo.title`-style paths, creating intermediate objects as needed.
fn set_path(map: &mut Map<String, Value>, path: &str, value: Value) -> Result<()> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(BulkError::InvalidInput(format!(
            "invalid field path: {:?}",
            path
        )));
    }
    if segments[0] == ID_FIELD || segments[0] == TYPE_FIELD {
        return Err(BulkError::Content(format!(
            "cannot change {} of an existing document",
            segments[0]
        )));
    }

    let Some((last, parents)) = segments.split_last() else {
        return Err(BulkError::InvalidInput("empty field path".to_string()));
    };
    let mut current = map;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match entry {
            Value::Object(inner) => inner,
            _ => {
                return Err(BulkError::Content(format!(
                    "cannot set {}: {} is not an object",
                    path, segment
                )))
            }
        };
    }
    current.insert(last.to_string(), value);
    Ok(())
}

/// Validates and stamps a new document before it is stored.
pub(crate) fn prepare_new(documents: &[Value], mut document: Map<String, Value>) -> Result<Value> {
    match document.get(TYPE_FIELD) {
        Some(Value::String(t)) if !t.is_empty() => {}
        _ => {
            return Err(BulkError::Content(
                "document is missing a string _type".to_string(),
            ))
        }
    }

    let id = match document.get(ID_FIELD) {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        None => Uuid::new_v4().to_string(),
        Some(_) => {
            return Err(BulkError::Content(
                "_id must be a non-empty string".to_string(),
            ))
        }
    };

    if documents
        .iter()
        .any(|d| d.get(ID_FIELD).and_then(Value::as_str) == Some(id.as_str()))
    {
        return Err(BulkError::Content(format!(
            "document with id {} already exists",
            id
        )));
    }

    let stamp = now_stamp();
    document.insert(ID_FIELD.to_string(), Value::String(id));
    document.insert(CREATED_AT_FIELD.to_string(), Value::String(stamp.clone()));
    document.insert(UPDATED_AT_FIELD.to_string(), Value::String(stamp));
    Ok(Value::Object(document))
}
