//! services/api/src/error.rs
//!
//! Defines the error types for the API service: `ApiError` for startup and
//! `PipelineError` for a single ingestion request.

use crate::config::ConfigError;
use health_assistant_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure while applying the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything that can stop a request inside the ingestion pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No valid session. Raised before any side effect.
    #[error("Unauthorized")]
    Unauthorized,

    /// A required field is missing or empty, or the upload type is not allowed.
    #[error("{0}")]
    BadInput(String),

    /// The uploaded document or image could not be decoded.
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// The generative model call itself failed.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// A read or write against the store failed.
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl PipelineError {
    pub fn bad_input(message: impl Into<String>) -> Self {
        PipelineError::BadInput(message.into())
    }

    /// The message that is safe to show a client. Internal detail stays in the logs.
    pub fn client_message(&self) -> String {
        match self {
            PipelineError::Unauthorized => "Unauthorized".to_string(),
            PipelineError::BadInput(message) => message.clone(),
            PipelineError::ExtractionFailed(_) => {
                "The uploaded file could not be read. Please upload a valid PDF or image.".to_string()
            }
            PipelineError::GenerationFailed(_) => {
                "The assistant is unavailable right now. Please try again later.".to_string()
            }
            PipelineError::StorageError(_) => {
                "Something went wrong while saving your request. Please try again.".to_string()
            }
        }
    }
}

impl From<PortError> for PipelineError {
    fn from(err: PortError) -> Self {
        PipelineError::StorageError(err.to_string())
    }
}
