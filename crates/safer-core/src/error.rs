use thiserror::Error;

/// Application-wide error types for the snapshot extractor.
///
/// Every variant is fatal to a run: the pipeline never retries and never
/// emits a partial record.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed (building, sending, or reading the body).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The page does not have the expected anchor, or no table follows it.
    #[error("Structure mismatch: {0}")]
    StructureMismatch(String),

    /// The target table has no cells, or its last cell has no content.
    #[error("Empty content: {0}")]
    EmptyContent(String),

    /// Input configuration is unreadable or malformed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Writing the output record failed.
    #[error("Sink error: {0}")]
    SinkError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AppError {
    /// Name of the pipeline step this error aborts.
    pub fn step(&self) -> &'static str {
        match self {
            AppError::ConfigError(_) => "config",
            AppError::HttpError(_) | AppError::Timeout(_) | AppError::NetworkError(_) => "request",
            AppError::StructureMismatch(_) => "locate",
            AppError::EmptyContent(_) => "extract",
            AppError::SinkError(_) | AppError::SerializationError(_) => "emit",
        }
    }
}
