use thiserror::Error;

/// Errors returned by the indexer and the query engine.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("cannot build an index from an empty corpus")]
    EmptyCorpus,

    #[error("field not configured: {0}")]
    FieldNotConfigured(String),

    #[error("duplicate document id: {0}")]
    DuplicateDocument(String),

    #[error("document {doc} has unknown field {field}")]
    UnknownField { doc: String, field: String },

    #[error("document {doc} field {field} must be text or null")]
    InvalidFieldType { doc: String, field: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to encode index: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::CorruptIndex(err.to_string())
    }
}

impl From<bincode::Error> for SearchError {
    fn from(err: bincode::Error) -> Self {
        SearchError::CorruptIndex(err.to_string())
    }
}

impl From<regex::Error> for SearchError {
    fn from(err: regex::Error) -> Self {
        SearchError::InvalidConfig(err.to_string())
    }
}
