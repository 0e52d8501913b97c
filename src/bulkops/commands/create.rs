use crate::batch::{BatchProcessor, Progress};
use crate::commands::{push_outcome_messages, track_progress, CmdMessage, CmdResult};
use crate::error::{BulkError, Result};
use crate::model::{Operation, TYPE_FIELD};
use crate::store::ContentClient;
use serde_json::{Map, Value};
use tracing::info;

/// Parses a raw template: one JSON value, or an array of them.
///
/// This is the only hard failure on the create path. Nothing is attempted
/// when the template doesn't parse.
pub fn parse_template(raw: &str) -> Result<Vec<Value>> {
    let parsed: Value = serde_json::from_str(raw).map_err(BulkError::Template)?;
    Ok(match parsed {
        Value::Array(entries) => entries,
        single => vec![single],
    })
}

/// Builds the document for one template entry.
///
/// The entry is laid over `{"_type": doc_type}`, so an entry carrying its own
/// `_type` keeps it.
pub fn seed_document(doc_type: &str, entry: &Value) -> Result<Map<String, Value>> {
    let Value::Object(fields) = entry else {
        return Err(BulkError::InvalidInput(
            "template entry is not a JSON object".to_string(),
        ));
    };
    let mut document = Map::new();
    document.insert(TYPE_FIELD.to_string(), Value::String(doc_type.to_string()));
    for (key, value) in fields {
        document.insert(key.clone(), value.clone());
    }
    Ok(document)
}

pub fn run<C: ContentClient>(
    client: &mut C,
    processor: &BatchProcessor,
    doc_type: &str,
    template: &str,
    on_progress: &mut dyn FnMut(&Progress),
) -> Result<CmdResult> {
    let doc_type = doc_type.trim();
    if doc_type.is_empty() {
        return Err(BulkError::InvalidInput(
            "a document type is required to create documents".to_string(),
        ));
    }
    if template.trim().is_empty() {
        return Err(BulkError::InvalidInput(
            "template data is required to create documents".to_string(),
        ));
    }

    let entries = parse_template(template)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::info("Creating documents..."));

    let mut created = Vec::new();
    let mut progress_messages = Vec::new();
    let outcome = processor.run(
        &entries,
        Operation::Create,
        |entry| {
            let document = seed_document(doc_type, entry)?;
            created.push(client.create(document)?);
            Ok(())
        },
        track_progress(&mut progress_messages, on_progress),
    );
    result.messages.extend(progress_messages);

    info!(
        processed = outcome.processed,
        failed = outcome.errors.len(),
        dry_run = processor.is_dry_run(),
        %doc_type,
        "bulk creation finished"
    );

    push_outcome_messages(&mut result, &outcome, processor.is_dry_run(), "creation");
    result.created = created;
    Ok(result.with_outcome(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchSize;
    use crate::store::memory::InMemoryClient;
    use serde_json::json;

    fn processor(dry_run: bool) -> BatchProcessor {
        BatchProcessor::new(BatchSize::default(), dry_run)
    }

    #[test]
    fn dry_run_counts_without_creating() {
        let mut client = InMemoryClient::new();
        let result = run(
            &mut client,
            &processor(true),
            "post",
            r#"{"title":"X"}"#,
            &mut |_: &Progress| {},
        )
        .unwrap();

        let outcome = result.outcome.unwrap();
        assert_eq!(outcome.processed, 1);
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.operation, Operation::Create);
        assert_eq!(client.create_calls(), 0);
        assert!(result.created.is_empty());
    }

    #[test]
    fn array_template_creates_each_entry() {
        let mut client = InMemoryClient::new();
        let result = run(
            &mut client,
            &processor(false),
            "post",
            r#"[{"title":"One"},{"title":"Two"}]"#,
            &mut |_: &Progress| {},
        )
        .unwrap();

        assert_eq!(result.outcome.unwrap().processed, 2);
        assert_eq!(client.documents().len(), 2);
        assert_eq!(client.documents()[0]["_type"], "post");
        assert_eq!(client.documents()[1]["title"], "Two");
        assert_eq!(result.created.len(), 2);
    }

    #[test]
    fn malformed_template_aborts_before_any_create() {
        let mut client = InMemoryClient::new();
        let err = run(
            &mut client,
            &processor(false),
            "post",
            r#"{"title": "#,
            &mut |_: &Progress| {},
        )
        .unwrap_err();

        assert!(matches!(err, BulkError::Template(_)));
        assert_eq!(client.create_calls(), 0);
    }

    #[test]
    fn failures_are_per_document() {
        let mut client = InMemoryClient::new();
        client.fail_create_call(0);
        let result = run(
            &mut client,
            &processor(false),
            "post",
            r#"[{"title":"A"}, 7, {"title":"C"}]"#,
            &mut |_: &Progress| {},
        )
        .unwrap();

        let outcome = result.outcome.unwrap();
        assert_eq!(outcome.processed, 1);
        assert_eq!(
            outcome.errors,
            vec![
                "Failed to create document: create rejected",
                "Failed to create document: template entry is not a JSON object",
            ]
        );
        assert_eq!(client.documents().len(), 1);
        assert_eq!(client.documents()[0]["title"], "C");
    }

    #[test]
    fn template_type_overrides_selected_type() {
        let doc = seed_document("post", &json!({"_type": "page", "title": "T"})).unwrap();
        assert_eq!(doc["_type"], "page");
        let doc = seed_document("post", &json!({"title": "T"})).unwrap();
        assert_eq!(doc["_type"], "post");
    }

    #[test]
    fn type_and_template_are_required() {
        let mut client = InMemoryClient::new();
        for (doc_type, template) in [("", r#"{"a":1}"#), ("post", "  ")] {
            let err = run(
                &mut client,
                &processor(false),
                doc_type,
                template,
                &mut |_: &Progress| {},
            )
            .unwrap_err();
            assert!(matches!(err, BulkError::InvalidInput(_)));
        }
    }
}
