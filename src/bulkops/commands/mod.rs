use crate::batch::Progress;
use crate::config::BulkConfig;
use crate::model::{OperationResult, RecordRef};
use serde_json::Value;
use std::path::PathBuf;

pub mod config;
pub mod create;
pub mod init;
pub mod modify;
pub mod search;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub records: Vec<RecordRef>,
    pub created: Vec<Value>,
    pub outcome: Option<OperationResult>,
    pub query: Option<String>,
    pub config: Option<BulkConfig>,
    pub paths: Vec<PathBuf>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_records(mut self, records: Vec<RecordRef>) -> Self {
        self.records = records;
        self
    }

    pub fn with_outcome(mut self, outcome: OperationResult) -> Self {
        self.outcome = Some(outcome);
        self
    }

    pub fn with_config(mut self, config: BulkConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// Wraps a caller's progress hook so every checkpoint also lands in the
/// result's status messages.
pub(crate) fn track_progress<'a, F>(
    messages: &'a mut Vec<CmdMessage>,
    on_progress: &'a mut F,
) -> impl FnMut(&Progress) + 'a
where
    F: FnMut(&Progress) + ?Sized,
{
    move |progress: &Progress| {
        messages.push(CmdMessage::info(progress.status_text()));
        on_progress(progress);
    }
}

/// Status line for a finished mutating run.
pub(crate) fn completion_message(outcome: &OperationResult, dry_run: bool, noun: &str) -> String {
    if dry_run {
        format!("Dry run complete: {} documents processed", outcome.processed)
    } else {
        format!(
            "Bulk {} complete: {} documents processed",
            noun, outcome.processed
        )
    }
}

pub(crate) fn push_outcome_messages(
    result: &mut CmdResult,
    outcome: &OperationResult,
    dry_run: bool,
    noun: &str,
) {
    for error in &outcome.errors {
        result.add_message(CmdMessage::error(error.clone()));
    }
    let summary = completion_message(outcome, dry_run, noun);
    if outcome.is_clean() {
        result.add_message(CmdMessage::success(summary));
    } else {
        result.add_message(CmdMessage::warning(format!(
            "{} ({} failed)",
            summary,
            outcome.errors.len()
        )));
    }
}
