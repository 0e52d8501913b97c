use super::{apply_patch, prepare_new, query, ContentClient};
use crate::error::{BulkError, Result};
use crate::model::Patch;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DATASET_FILENAME: &str = "dataset.json";

/// A dataset kept in a single JSON file.
///
/// Every call re-reads the file so edits made outside bulkops are picked up;
/// every successful mutation rewrites it.
pub struct FileClient {
    root: PathBuf,
}

impl FileClient {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.root.join(DATASET_FILENAME)
    }

    /// Creates the directory and an empty dataset if neither exists yet.
    pub fn ensure_initialized(&self) -> Result<bool> {
        self.ensure_dir()?;
        let path = self.dataset_path();
        if path.exists() {
            return Ok(false);
        }
        self.save_documents(&[])?;
        Ok(true)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(BulkError::Io)?;
        }
        Ok(())
    }

    fn load(&self) -> Result<Vec<Value>> {
        let path = self.dataset_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).map_err(BulkError::Io)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str(&content).map_err(BulkError::Serialization)? {
            Value::Array(documents) => Ok(documents),
            _ => Err(BulkError::Content(format!(
                "{} must contain a JSON array of documents",
                path.display()
            ))),
        }
    }

    fn save_documents(&self, documents: &[Value]) -> Result<()> {
        self.ensure_dir()?;
        let content = serde_json::to_string_pretty(documents).map_err(BulkError::Serialization)?;
        fs::write(self.dataset_path(), content).map_err(BulkError::Io)?;
        Ok(())
    }
}

impl ContentClient for FileClient {
    fn fetch(&self, query: &str) -> Result<Vec<Value>> {
        let documents = self.load()?;
        debug!(documents = documents.len(), %query, "evaluating query against dataset");
        query::evaluate(query, &documents)
    }

    fn commit(&mut self, patch: &Patch) -> Result<()> {
        let mut documents = self.load()?;
        apply_patch(&mut documents, patch)?;
        self.save_documents(&documents)
    }

    fn create(&mut self, document: Map<String, Value>) -> Result<Value> {
        let mut documents = self.load()?;
        let stored = prepare_new(&documents, document)?;
        documents.push(stored.clone());
        self.save_documents(&documents)?;
        Ok(stored)
    }
}
