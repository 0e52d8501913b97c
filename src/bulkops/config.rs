use crate::batch::{BatchSize, DEFAULT_BATCH_SIZE};
use crate::error::{BulkError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";
pub const DEFAULT_MAX_DOCUMENTS: usize = 1000;

/// Settings for bulk operations, stored in .bulkops/config.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkConfig {
    /// Document types offered for selection. Empty means any type.
    #[serde(default)]
    pub document_types: Vec<String>,

    /// Records per progress checkpoint
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Simulate mutations without touching the store
    #[serde(default)]
    pub dry_run: bool,

    /// Upper bound on search results
    #[serde(default = "default_max_documents")]
    pub max_documents: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_max_documents() -> usize {
    DEFAULT_MAX_DOCUMENTS
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            document_types: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            dry_run: false,
            max_documents: DEFAULT_MAX_DOCUMENTS,
        }
    }
}

impl BulkConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(BulkError::Io)?;
        let config: BulkConfig = serde_json::from_str(&content)
            .map_err(|e| BulkError::Config(format!("{}: {}", config_path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        self.validate()?;
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(BulkError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(BulkError::Serialization)?;
        fs::write(config_path, content).map_err(BulkError::Io)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.batch_size()?;
        if self.max_documents == 0 {
            return Err(BulkError::Config(
                "max_documents must be at least 1".to_string(),
            ));
        }
        if self.document_types.iter().any(|t| t.trim().is_empty()) {
            return Err(BulkError::Config(
                "document_types must not contain empty names".to_string(),
            ));
        }
        Ok(())
    }

    pub fn batch_size(&self) -> Result<BatchSize> {
        BatchSize::new(self.batch_size)
            .map_err(|_| BulkError::Config("batch_size must be at least 1".to_string()))
    }

    /// Checks a requested type against the configured list.
    pub fn check_type(&self, doc_type: &str) -> Result<()> {
        if self.document_types.is_empty() || self.document_types.iter().any(|t| t == doc_type) {
            return Ok(());
        }
        Err(BulkError::InvalidInput(format!(
            "document type '{}' is not one of: {}",
            doc_type,
            self.document_types.join(", ")
        )))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "document-types" => Some(self.document_types.join(",")),
            "batch-size" => Some(self.batch_size.to_string()),
            "dry-run" => Some(self.dry_run.to_string()),
            "max-documents" => Some(self.max_documents.to_string()),
            _ => None,
        }
    }

    /// Sets a value by its CLI key, validating the result.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut next = self.clone();
        match key {
            "document-types" => {
                next.document_types = value
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "batch-size" => next.batch_size = parse_number(key, value)?,
            "max-documents" => next.max_documents = parse_number(key, value)?,
            "dry-run" => {
                next.dry_run = value.parse().map_err(|_| {
                    BulkError::Config(format!("dry-run expects true or false, got '{}'", value))
                })?
            }
            other => return Err(BulkError::Config(format!("Unknown config key: {}", other))),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    pub const KEYS: [&'static str; 4] =
        ["document-types", "batch-size", "dry-run", "max-documents"];
}

fn parse_number(key: &str, value: &str) -> Result<usize> {
    value.trim().parse().map_err(|_| {
        BulkError::Config(format!(
            "{} expects a positive integer, got '{}'",
            key, value
        ))
    })
}
