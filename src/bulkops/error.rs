use thiserror::Error;

#[derive(Error, Debug)]
pub enum BulkError {
    #[error("Search error: {0}")]
    Query(String),

    #[error("Operation error: {0}")]
    Template(#[source] serde_json::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Content error: {0}")]
    Content(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BulkError {
    /// The bare failure message, without the status prefix.
    ///
    /// This is what `on_error` callbacks and per-record error lines receive.
    pub fn reason(&self) -> String {
        match self {
            BulkError::Query(msg)
            | BulkError::InvalidRecord(msg)
            | BulkError::InvalidInput(msg)
            | BulkError::Content(msg)
            | BulkError::Config(msg) => msg.clone(),
            BulkError::NotFound(id) => format!("Document not found: {}", id),
            BulkError::Template(e) | BulkError::Serialization(e) => e.to_string(),
            BulkError::Io(e) => e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BulkError>;
