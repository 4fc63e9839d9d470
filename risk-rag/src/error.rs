//! Error types for the `risk-rag` crate.

use thiserror::Error;

/// Errors that can occur while indexing, retrieving or answering.
#[derive(Debug, Error)]
pub enum RagError {
    /// The record source could not be read.
    #[error("Storage error ({source_name}): {message}")]
    StorageError {
        /// A description of the source, usually its path.
        source_name: String,
        /// A description of the failure.
        message: String,
    },

    /// The record source was read but is not a JSON array of objects.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The nearest-neighbour index rejected its input.
    #[error("Index error: {0}")]
    IndexError(String),

    /// The generation backend failed to produce an answer.
    #[error("Generation error ({backend}): {message}")]
    GenerationError {
        /// The generation backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the question-answering pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

/// A convenience result type for risk-rag operations.
pub type Result<T> = std::result::Result<T, RagError>;
