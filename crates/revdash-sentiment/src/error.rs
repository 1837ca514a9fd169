use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("no text provided")]
    EmptyText,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("review data not loaded")]
    NotLoaded,

    #[error("review {id} has unparseable date '{value}'")]
    InvalidDate { id: i64, value: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("review source error: {0}")]
    Source(String),

    #[error("scorer error: {0}")]
    Scorer(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embed error: {0}")]
    Embed(String),

    #[error("embedding cache error: {0}")]
    Cache(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used by dispatchers to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller misuse; the request can be corrected and retried.
    Client,
    /// No corpus has been published yet.
    DataUnavailable,
    Internal,
}

impl SentimentError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyText | Self::InvalidParameter(_) => ErrorKind::Client,
            Self::NotLoaded => ErrorKind::DataUnavailable,
            _ => ErrorKind::Internal,
        }
    }
}
