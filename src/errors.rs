use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Query execution error: {0}")]
    QueryExecution(String),

    #[error("Deserialization error: {0}")]
    Deserialization(serde_json::Error),

    /// The container produced no page at all; a query always yields at least one.
    #[error("query feed produced no pages")]
    EmptyFeed,

    #[error("Item already exists: {0}")]
    Conflict(String),
}

impl From<std::io::Error> for DbError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
