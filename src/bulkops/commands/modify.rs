use crate::batch::{BatchProcessor, Progress};
use crate::commands::{push_outcome_messages, track_progress, CmdMessage, CmdResult};
use crate::error::{BulkError, Result};
use crate::model::{Operation, Patch, RecordRef};
use crate::store::ContentClient;
use serde_json::Value;
use tracing::info;

/// Sets `field` to `value` on every record, one patch per record.
pub fn run<C: ContentClient>(
    client: &mut C,
    processor: &BatchProcessor,
    records: &[RecordRef],
    field: &str,
    value: &Value,
    on_progress: &mut dyn FnMut(&Progress),
) -> Result<CmdResult> {
    let field = field.trim();
    if field.is_empty() {
        return Err(BulkError::InvalidInput(
            "a field to modify is required".to_string(),
        ));
    }

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::info("Processing bulk modifications..."));

    let mut progress_messages = Vec::new();
    let outcome = processor.run(
        records,
        Operation::Modify,
        |record| client.commit(&Patch::new(record.id.clone()).set(field, value.clone())),
        track_progress(&mut progress_messages, on_progress),
    );
    result.messages.extend(progress_messages);

    info!(
        processed = outcome.processed,
        failed = outcome.errors.len(),
        dry_run = processor.is_dry_run(),
        %field,
        "bulk modification finished"
    );

    push_outcome_messages(&mut result, &outcome, processor.is_dry_run(), "modification");
    Ok(result.with_outcome(outcome))
}
