use crate::error::{BulkError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const ID_FIELD: &str = "_id";
pub const TYPE_FIELD: &str = "_type";

/// A validated reference to a document owned by the content store.
///
/// Rows come back from the host untyped; `from_value` is the only way in,
/// so every `RecordRef` is known to carry a string `_id` and `_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRef {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl RecordRef {
    pub fn new(id: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            doc_type: doc_type.into(),
            title: None,
            name: None,
            attributes: Map::new(),
        }
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(BulkError::InvalidRecord(format!(
                "expected a document object, got {}",
                kind_of(&value)
            )));
        };

        let id = take_string(&mut map, ID_FIELD)?;
        let doc_type = take_string(&mut map, TYPE_FIELD)
            .map_err(|_| BulkError::InvalidRecord(format!("document {} has no _type", id)))?;
        let title = take_display(&mut map, "title");
        let name = take_display(&mut map, "name");

        Ok(Self {
            id,
            doc_type,
            title,
            name,
            attributes: map,
        })
    }

    /// Human-facing label: title, falling back to name.
    pub fn label(&self) -> Option<&str> {
        self.title.as_deref().or(self.name.as_deref())
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Result<String> {
    match map.remove(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(other) => Err(BulkError::InvalidRecord(format!(
            "{} must be a non-empty string, got {}",
            key,
            kind_of(&other)
        ))),
        None => Err(BulkError::InvalidRecord(format!("missing {}", key))),
    }
}

// Display fields that aren't strings stay in the attribute map untouched.
fn take_display(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(_)) => match map.remove(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        },
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Search,
    Modify,
    Create,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Search => "search",
            Operation::Modify => "modify",
            Operation::Create => "create",
        }
    }

    /// Formats one per-record failure line.
    pub fn failure_message(&self, target: Option<&str>, reason: &str) -> String {
        match (self, target) {
            (Operation::Create, _) => format!("Failed to create document: {}", reason),
            (op, Some(id)) => format!("Failed to {} {}: {}", op, id, reason),
            (op, None) => format!("Failed to {} document: {}", op, reason),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate outcome of one bulk invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub processed: usize,
    pub errors: Vec<String>,
    pub operation: Operation,
}

impl OperationResult {
    pub fn empty(operation: Operation) -> Self {
        Self {
            processed: 0,
            errors: Vec::new(),
            operation,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A partial update of one document: ordered `set` assignments.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub id: String,
    pub set: Vec<(String, Value)>,
}

impl Patch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            set: Vec::new(),
        }
    }

    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.set.push((field.into(), value));
        self
    }
}

/// What a bulk run does to each target.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Set one field on every resolved record.
    Set { field: String, value: Value },
    /// Seed new documents of `doc_type` from a raw JSON template.
    Create { doc_type: String, template: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_keeps_extra_attributes() {
        let rec = RecordRef::from_value(json!({
            "_id": "a",
            "_type": "post",
            "title": "Hello",
            "views": 3
        }))
        .unwrap();
        assert_eq!(rec.id, "a");
        assert_eq!(rec.doc_type, "post");
        assert_eq!(rec.label(), Some("Hello"));
        assert_eq!(rec.attributes.get("views"), Some(&json!(3)));
        assert!(!rec.attributes.contains_key("_id"));
    }

    #[test]
    fn record_label_falls_back_to_name() {
        let rec = RecordRef::from_value(json!({"_id": "a", "_type": "author", "name": "Ada"}))
            .unwrap();
        assert_eq!(rec.label(), Some("Ada"));
    }

    #[test]
    fn non_string_title_stays_an_attribute() {
        let rec =
            RecordRef::from_value(json!({"_id": "a", "_type": "post", "title": {"en": "Hi"}}))
                .unwrap();
        assert_eq!(rec.title, None);
        assert!(rec.attributes.contains_key("title"));
    }

    #[test]
    fn rejects_rows_without_identity() {
        assert!(matches!(
            RecordRef::from_value(json!({"_type": "post"})),
            Err(BulkError::InvalidRecord(_))
        ));
        assert!(matches!(
            RecordRef::from_value(json!({"_id": 4, "_type": "post"})),
            Err(BulkError::InvalidRecord(_))
        ));
        assert!(matches!(
            RecordRef::from_value(json!({"_id": "a"})),
            Err(BulkError::InvalidRecord(_))
        ));
        assert!(matches!(
            RecordRef::from_value(json!("a")),
            Err(BulkError::InvalidRecord(_))
        ));
    }

    #[test]
    fn failure_messages_match_operation() {
        assert_eq!(
            Operation::Modify.failure_message(Some("b"), "boom"),
            "Failed to modify b: boom"
        );
        assert_eq!(
            Operation::Create.failure_message(None, "boom"),
            "Failed to create document: boom"
        );
    }

    #[test]
    fn result_serializes_operation_lowercase() {
        let result = OperationResult::empty(Operation::Modify);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["operation"], "modify");
        assert_eq!(json["processed"], 0);
    }
}
