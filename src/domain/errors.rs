//! Domain error types
//!
//! This module defines the error hierarchy for LexRedact. All errors are
//! domain-specific and don't expose third-party types: HTTP client and regex
//! failures are flattened into strings at the adapter boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main LexRedact error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum LexRedactError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Recognition stage errors
    #[error("Recognition error: {0}")]
    Recognition(#[from] RecognitionError),

    /// Generative backend errors
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Pipeline orchestration errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Which generative backend an error or result refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Locally hosted model addressed by URL
    Local,
    /// Remote hosted model addressed by base URL and API key
    Remote,
}

impl BackendKind {
    /// Short human-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recognition-specific errors
///
/// Raised by the pattern and entity recognizers. Cloneable so a model load
/// failure captured at construction can be reported on every invocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecognitionError {
    /// The statistical entity model could not be loaded
    #[error("Entity model '{model}' unavailable: {reason}")]
    ModelUnavailable { model: String, reason: String },

    /// The entity model file was read but is malformed
    #[error("Entity model '{model}' is invalid: {reason}")]
    InvalidModel { model: String, reason: String },

    /// A pattern in the pattern library failed to compile or is unknown
    #[error("Invalid pattern '{name}': {reason}")]
    InvalidPattern { name: String, reason: String },
}

/// Generative backend errors
///
/// Connection failure, timeout and empty response are deliberately distinct
/// so callers can tell "model unreachable" apart from "model returned nothing".
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// The backend could not be reached
    #[error("Failed to connect to {backend} model backend at {endpoint}: {reason}")]
    ConnectionFailed {
        backend: BackendKind,
        endpoint: String,
        reason: String,
    },

    /// The backend did not answer within the configured window
    #[error("Request to {backend} model backend at {endpoint} timed out after {timeout_secs}s")]
    Timeout {
        backend: BackendKind,
        endpoint: String,
        timeout_secs: u64,
    },

    /// The backend answered successfully but produced no usable text
    #[error("The {backend} model backend returned an empty response (model: {model})")]
    EmptyResponse { backend: BackendKind, model: String },

    /// The backend answered with a non-success status
    #[error("The {backend} model backend rejected the request: {status} - {message}")]
    Rejected {
        backend: BackendKind,
        status: u16,
        message: String,
    },

    /// The response body could not be decoded
    #[error("Invalid response from {backend} model backend: {reason}")]
    InvalidResponse { backend: BackendKind, reason: String },
}

impl GenerationError {
    /// The backend the failed request was sent to
    pub fn backend(&self) -> BackendKind {
        match self {
            Self::ConnectionFailed { backend, .. }
            | Self::Timeout { backend, .. }
            | Self::EmptyResponse { backend, .. }
            | Self::Rejected { backend, .. }
            | Self::InvalidResponse { backend, .. } => *backend,
        }
    }

    /// Classify this error for the pipeline result
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::ConnectionFailed { .. } => FailureKind::GenerationConnectionFailed,
            Self::Timeout { .. } => FailureKind::GenerationTimeout,
            Self::EmptyResponse { .. } => FailureKind::GenerationEmptyResponse,
            Self::Rejected { .. } | Self::InvalidResponse { .. } => FailureKind::GenerationRejected,
        }
    }
}

/// Pipeline orchestration errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// Entity recognition failed and degradation is disabled
    #[error("Entity recognition unavailable: {0}")]
    RecognitionUnavailable(RecognitionError),

    /// A single-chunk rewrite failed
    #[error("{0}")]
    Generation(GenerationError),

    /// One chunk of a multi-chunk document failed; no partial result is kept
    #[error("Chunk {chunk}/{total} failed: {source}")]
    ChunkProcessingFailed {
        chunk: usize,
        total: usize,
        source: GenerationError,
    },

    /// The pipeline was built from an unusable configuration
    #[error("Pipeline misconfigured: {0}")]
    Misconfigured(String),
}

impl PipelineError {
    /// Classify this error for the pipeline result
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::RecognitionUnavailable(_) => FailureKind::RecognitionUnavailable,
            Self::Generation(e) => e.failure_kind(),
            Self::ChunkProcessingFailed { .. } => FailureKind::ChunkProcessingFailed,
            Self::Misconfigured(_) => FailureKind::Configuration,
        }
    }

    /// The backend involved, when the failure came from generation
    pub fn backend(&self) -> Option<BackendKind> {
        match self {
            Self::Generation(e) | Self::ChunkProcessingFailed { source: e, .. } => Some(e.backend()),
            _ => None,
        }
    }
}

/// Serializable failure classification reported in a pipeline result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    RecognitionUnavailable,
    GenerationConnectionFailed,
    GenerationTimeout,
    GenerationEmptyResponse,
    GenerationRejected,
    ChunkProcessingFailed,
    Configuration,
}

// Conversion from std::io::Error
impl From<std::io::Error> for LexRedactError {
    fn from(err: std::io::Error) -> Self {
        LexRedactError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for LexRedactError {
    fn from(err: serde_json::Error) -> Self {
        LexRedactError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for LexRedactError {
    fn from(err: toml::de::Error) -> Self {
        LexRedactError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LexRedactError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_recognition_error_conversion() {
        let err = RecognitionError::ModelUnavailable {
            model: "ru_kk".to_string(),
            reason: "missing".to_string(),
        };
        let top: LexRedactError = err.into();
        assert!(matches!(top, LexRedactError::Recognition(_)));
    }

    #[test]
    fn test_generation_errors_are_distinct() {
        let connection = GenerationError::ConnectionFailed {
            backend: BackendKind::Local,
            endpoint: "http://localhost:11434".to_string(),
            reason: "refused".to_string(),
        };
        let timeout = GenerationError::Timeout {
            backend: BackendKind::Local,
            endpoint: "http://localhost:11434".to_string(),
            timeout_secs: 300,
        };
        let empty = GenerationError::EmptyResponse {
            backend: BackendKind::Remote,
            model: "gpt".to_string(),
        };

        assert_eq!(connection.failure_kind(), FailureKind::GenerationConnectionFailed);
        assert_eq!(timeout.failure_kind(), FailureKind::GenerationTimeout);
        assert_eq!(empty.failure_kind(), FailureKind::GenerationEmptyResponse);
        assert_eq!(empty.backend(), BackendKind::Remote);
        assert!(connection.to_string().contains("local"));
    }

    #[test]
    fn test_chunk_failure_reports_backend() {
        let err = PipelineError::ChunkProcessingFailed {
            chunk: 2,
            total: 3,
            source: GenerationError::EmptyResponse {
                backend: BackendKind::Remote,
                model: "m".to_string(),
            },
        };
        assert_eq!(err.failure_kind(), FailureKind::ChunkProcessingFailed);
        assert_eq!(err.backend(), Some(BackendKind::Remote));
        assert!(err.to_string().starts_with("Chunk 2/3 failed"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: LexRedactError = io_err.into();
        assert!(matches!(err, LexRedactError::Io(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: LexRedactError = toml_err.into();
        assert!(matches!(err, LexRedactError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let err = LexRedactError::Other("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
