use super::{apply_patch, prepare_new, query, ContentClient};
use crate::error::{BulkError, Result};
use crate::model::{Patch, ID_FIELD};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// In-memory dataset. Used by tests and anywhere persistence isn't wanted.
#[derive(Debug, Default)]
pub struct InMemoryClient {
    documents: Vec<Value>,
    failing_ids: HashSet<String>,
    failing_creates: HashSet<usize>,
    fail_fetch: Option<String>,
    create_calls: usize,
    commits: Vec<Patch>,
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, document: Value) {
        self.documents.push(document);
    }

    pub fn documents(&self) -> &[Value] {
        &self.documents
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.documents
            .iter()
            .find(|d| d.get(ID_FIELD).and_then(Value::as_str) == Some(id))
    }

    /// Commits against `id` will fail until cleared.
    pub fn fail_commits_for(&mut self, id: impl Into<String>) {
        self.failing_ids.insert(id.into());
    }

    /// The `nth` create call (zero-based, counted over the client's lifetime) fails.
    pub fn fail_create_call(&mut self, nth: usize) {
        self.failing_creates.insert(nth);
    }

    pub fn fail_fetch_with(&mut self, message: impl Into<String>) {
        self.fail_fetch = Some(message.into());
    }

    /// Patches that were committed successfully, in order.
    pub fn commits(&self) -> &[Patch] {
        &self.commits
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls
    }
}

impl ContentClient for InMemoryClient {
    fn fetch(&self, query: &str) -> Result<Vec<Value>> {
        if let Some(message) = &self.fail_fetch {
            return Err(BulkError::Query(message.clone()));
        }
        query::evaluate(query, &self.documents)
    }

    fn commit(&mut self, patch: &Patch) -> Result<()> {
        if self.failing_ids.contains(&patch.id) {
            return Err(BulkError::Content(format!(
                "mutation rejected for {}",
                patch.id
            )));
        }
        apply_patch(&mut self.documents, patch)?;
        self.commits.push(patch.clone());
        Ok(())
    }

    fn create(&mut self, document: Map<String, Value>) -> Result<Value> {
        let call = self.create_calls;
        self.create_calls += 1;
        if self.failing_creates.contains(&call) {
            return Err(BulkError::Content("create rejected".to_string()));
        }
        let stored = prepare_new(&self.documents, document)?;
        self.documents.push(stored.clone());
        Ok(stored)
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use serde_json::json;

    pub struct ClientFixture {
        pub client: InMemoryClient,
    }

    impl Default for ClientFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ClientFixture {
        pub fn new() -> Self {
            Self {
                client: InMemoryClient::new(),
            }
        }

        pub fn with_posts(mut self, count: usize) -> Self {
            for i in 0..count {
                self.client.insert(json!({
                    "_id": format!("post-{}", i + 1),
                    "_type": "post",
                    "title": format!("Test Post {}", i + 1),
                }));
            }
            self
        }

        pub fn with_doc(mut self, id: &str, doc_type: &str, title: &str) -> Self {
            self.client
                .insert(json!({"_id": id, "_type": doc_type, "title": title}));
            self
        }

        pub fn with_author(mut self, id: &str, name: &str) -> Self {
            self.client
                .insert(json!({"_id": id, "_type": "author", "name": name}));
            self
        }

        pub fn failing_on(mut self, id: &str) -> Self {
            self.client.fail_commits_for(id);
            self
        }
    }
}
