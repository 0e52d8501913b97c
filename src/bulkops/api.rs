//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the single
//! entry point for bulk operations, whatever UI sits on top.
//!
//! ## Role and Responsibilities
//!
//! The facade:
//! - **Dispatches** to the appropriate command function
//! - **Normalizes inputs** (config defaults, allowed document types, batch size)
//! - **Concludes operations**: every operation that finishes calls exactly one
//!   of `on_complete` / `on_error`
//!
//! It does no I/O of its own and returns data, not strings.
//!
//! ## Generic Over ContentClient
//!
//! `BulkOps<C: ContentClient>`:
//! - CLI: `BulkOps<FileClient>`
//! - Testing: `BulkOps<InMemoryClient>`

use crate::batch::{BatchProcessor, BatchSize, Progress};
use crate::commands;
use crate::config::BulkConfig;
use crate::error::{BulkError, Result};
use crate::model::{Mutation, OperationResult, RecordRef};
use crate::store::ContentClient;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::error;

pub type CompleteHook = Box<dyn FnMut(&OperationResult)>;
pub type ErrorHook = Box<dyn FnMut(&str)>;
pub type ProgressHook = Box<dyn FnMut(&Progress)>;

/// Hooks the embedding application registers.
#[derive(Default)]
pub struct Callbacks {
    on_complete: Option<CompleteHook>,
    on_error: Option<ErrorHook>,
    on_progress: Option<ProgressHook>,
}

impl Callbacks {
    fn complete(&mut self, outcome: &OperationResult) {
        if let Some(hook) = self.on_complete.as_mut() {
            hook(outcome);
        }
    }

    fn fail(&mut self, message: &str) {
        if let Some(hook) = self.on_error.as_mut() {
            hook(message);
        }
    }

    fn progress(&mut self, progress: &Progress) {
        if let Some(hook) = self.on_progress.as_mut() {
            hook(progress);
        }
    }
}

/// The main API facade for bulk operations.
pub struct BulkOps<C: ContentClient> {
    client: C,
    config: BulkConfig,
    data_dir: PathBuf,
    batch_size: BatchSize,
    dry_run_override: Option<bool>,
    batch_size_override: Option<BatchSize>,
    callbacks: Callbacks,
}

impl<C: ContentClient> BulkOps<C> {
    pub fn new(client: C, config: BulkConfig, data_dir: impl Into<PathBuf>) -> Result<Self> {
        config.validate()?;
        let batch_size = config.batch_size()?;
        Ok(Self {
            client,
            batch_size,
            dry_run_override: None,
            batch_size_override: None,
            config,
            data_dir: data_dir.into(),
            callbacks: Callbacks::default(),
        })
    }

    /// Overrides the configured dry-run setting, including later config changes.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run_override = Some(dry_run);
        self
    }

    /// Overrides the configured batch size, including later config changes.
    pub fn with_batch_size(mut self, batch_size: BatchSize) -> Self {
        self.batch_size_override = Some(batch_size);
        self
    }

    pub fn on_complete(mut self, hook: impl FnMut(&OperationResult) + 'static) -> Self {
        self.callbacks.on_complete = Some(Box::new(hook));
        self
    }

    pub fn on_error(mut self, hook: impl FnMut(&str) + 'static) -> Self {
        self.callbacks.on_error = Some(Box::new(hook));
        self
    }

    pub fn on_progress(mut self, hook: impl FnMut(&Progress) + 'static) -> Self {
        self.callbacks.on_progress = Some(Box::new(hook));
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &BulkConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run_override.unwrap_or(self.config.dry_run)
    }

    pub fn batch_size(&self) -> BatchSize {
        self.batch_size_override.unwrap_or(self.batch_size)
    }

    /// Resolves a record set. Without an explicit limit the configured
    /// `max_documents` applies.
    pub fn search(&mut self, mut request: SearchRequest) -> Result<CmdResult> {
        let checked = match request.doc_type() {
            Some(t) => self.config.check_type(t),
            None => Ok(()),
        };
        request
            .max_documents
            .get_or_insert(self.config.max_documents);
        let result = checked.and_then(|_| commands::search::run(&self.client, &request));
        self.conclude(result)
    }

    pub fn modify(
        &mut self,
        records: &[RecordRef],
        field: &str,
        value: Value,
    ) -> Result<CmdResult> {
        let processor = self.processor();
        let Self {
            client, callbacks, ..
        } = self;
        let result = commands::modify::run(
            client,
            &processor,
            records,
            field,
            &value,
            &mut |p: &Progress| callbacks.progress(p),
        );
        self.conclude(result)
    }

    pub fn create(&mut self, doc_type: &str, template: &str) -> Result<CmdResult> {
        if let Err(e) = self.config.check_type(doc_type.trim()) {
            return self.conclude(Err(e));
        }
        let processor = self.processor();
        let Self {
            client, callbacks, ..
        } = self;
        let result = commands::create::run(
            client,
            &processor,
            doc_type,
            template,
            &mut |p: &Progress| callbacks.progress(p),
        );
        self.conclude(result)
    }

    /// Runs a mutation over `records` (ignored for creates).
    pub fn apply(&mut self, records: &[RecordRef], mutation: Mutation) -> Result<CmdResult> {
        match mutation {
            Mutation::Set { field, value } => self.modify(records, &field, value),
            Mutation::Create { doc_type, template } => self.create(&doc_type, &template),
        }
    }

    pub fn config_action(&mut self, action: ConfigAction) -> Result<CmdResult> {
        let result = commands::config::run(&self.data_dir, action)?;
        if let Some(config) = &result.config {
            self.batch_size = config.batch_size()?;
            self.config = config.clone();
        }
        Ok(result)
    }

    pub fn init(&self) -> Result<CmdResult> {
        commands::init::run(&self.data_dir)
    }

    fn processor(&self) -> BatchProcessor {
        BatchProcessor::new(self.batch_size(), self.is_dry_run())
    }

    fn conclude(&mut self, result: Result<CmdResult>) -> Result<CmdResult> {
        match &result {
            Ok(cmd) => {
                if let Some(outcome) = &cmd.outcome {
                    self.callbacks.complete(outcome);
                }
            }
            Err(e) => {
                error!(error = %e, "operation failed");
                self.callbacks.fail(&e.reason());
            }
        }
        result
    }
}

/// Parses a CLI-style value: JSON when asked for, a plain string otherwise.
pub fn parse_value(raw: &str, as_json: bool) -> Result<Value> {
    if as_json {
        serde_json::from_str(raw)
            .map_err(|e| BulkError::InvalidInput(format!("value is not valid JSON: {}", e)))
    } else {
        Ok(Value::String(raw.to_string()))
    }
}

pub use crate::commands::config::ConfigAction;
pub use crate::commands::search::{build_query, SearchRequest};
pub use crate::commands::{CmdMessage, CmdResult, MessageLevel};
