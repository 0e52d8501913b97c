use crate::commands::{CmdMessage, CmdResult};
use crate::config::DEFAULT_MAX_DOCUMENTS;
use crate::error::{BulkError, Result};
use crate::model::{Operation, OperationResult, RecordRef};
use crate::store::ContentClient;
use tracing::{debug, info};

/// What to look for. A non-empty `custom_query` wins over the other fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub doc_type: Option<String>,
    pub text: Option<String>,
    pub custom_query: Option<String>,
    pub max_documents: Option<usize>,
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    pub fn matching(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn custom(mut self, query: impl Into<String>) -> Self {
        self.custom_query = Some(query.into());
        self
    }

    pub fn limit(mut self, max_documents: usize) -> Self {
        self.max_documents = Some(max_documents);
        self
    }

    fn custom_query(&self) -> Option<&str> {
        self.custom_query.as_deref().filter(|q| !q.is_empty())
    }

    pub fn doc_type(&self) -> Option<&str> {
        self.doc_type.as_deref().filter(|t| !t.is_empty())
    }

    fn limit_or_default(&self) -> usize {
        self.max_documents.unwrap_or(DEFAULT_MAX_DOCUMENTS)
    }
}

/// Builds the query string sent to the host.
///
/// Type and text are interpolated as-is, without escaping. A quote in the
/// search text changes the meaning of the query.
pub fn build_query(request: &SearchRequest) -> String {
    if let Some(custom) = request.custom_query() {
        return custom.to_string();
    }

    let type_filter = match request.doc_type() {
        Some(t) => format!("_type == \"{}\"", t),
        None => "defined(_type)".to_string(),
    };
    let search_filter = match request.text.as_deref() {
        Some(text) if !text.is_empty() => format!(
            " && (title match \"*{}*\" || name match \"*{}*\")",
            text, text
        ),
        _ => String::new(),
    };

    format!(
        "*[{}{}][0...{}]",
        type_filter,
        search_filter,
        request.limit_or_default()
    )
}

pub fn run<C: ContentClient>(client: &C, request: &SearchRequest) -> Result<CmdResult> {
    if request.custom_query().is_none() && request.limit_or_default() == 0 {
        return Err(BulkError::InvalidInput(
            "max documents must be at least 1".to_string(),
        ));
    }

    let query = build_query(request);
    debug!(%query, "fetching documents");

    let rows = client.fetch(&query).map_err(|e| match e {
        BulkError::Query(_) => e,
        other => BulkError::Query(other.reason()),
    })?;

    let records = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            RecordRef::from_value(row).map_err(|e| {
                BulkError::InvalidRecord(format!("result {}: {}", i + 1, e.reason()))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(found = records.len(), "search complete");

    let outcome = OperationResult {
        processed: records.len(),
        errors: Vec::new(),
        operation: Operation::Search,
    };
    let mut result = CmdResult::default()
        .with_records(records)
        .with_outcome(outcome);
    result.add_message(CmdMessage::info(format!(
        "Found {} documents",
        result.records.len()
    )));
    result.query = Some(query);
    Ok(result)
}
