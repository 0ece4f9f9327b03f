//! Generative backend trait definition
//!
//! This module defines the `GenerativeBackend` trait that abstracts the model
//! servers the rewriter can talk to. A locally hosted model and a remote
//! chat-completion API sit behind the same interface, so the pipeline never
//! needs to know which one it was given.

use crate::domain::{BackendKind, GenerationError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of checking a backend connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// The backend answered the connection check
    pub connected: bool,

    /// The requested model is served by the backend
    pub model_available: bool,

    /// Models reported by the backend (empty when it does not list them)
    pub available_models: Vec<String>,

    /// Model named in the configuration
    pub requested_model: String,
}

/// Trait for generative model backends
///
/// # Example
///
/// ```no_run
/// use lexredact::adapters::llm::{create_backend, GenerativeBackend};
/// use lexredact::config::ProviderConfig;
///
/// # async fn example() -> lexredact::domain::Result<()> {
/// let backend = create_backend(&ProviderConfig::default())?;
///
/// let status = backend.check_connection().await?;
/// if status.model_available {
///     let text = backend.generate("Перепиши текст: ...").await?;
///     println!("{text}");
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Which kind of backend this is
    fn kind(&self) -> BackendKind;

    /// URL the backend is addressed at
    fn endpoint(&self) -> &str;

    /// Model identifier sent with every request
    fn model(&self) -> &str;

    /// Generate a completion for `prompt`
    ///
    /// No retries are performed.
    ///
    /// # Errors
    ///
    /// Connection failure, timeout, an empty answer, a rejected request and an
    /// undecodable body are reported as distinct [`GenerationError`] variants.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Check that the backend is reachable and serves the configured model
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached at all.
    async fn check_connection(&self) -> Result<ConnectionStatus, GenerationError>;
}

/// Map a transport-level reqwest error onto the generation error taxonomy
pub(crate) fn transport_error(
    err: reqwest::Error,
    backend: BackendKind,
    endpoint: &str,
    timeout_secs: u64,
) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout {
            backend,
            endpoint: endpoint.to_string(),
            timeout_secs,
        }
    } else if err.is_decode() {
        GenerationError::InvalidResponse {
            backend,
            reason: err.to_string(),
        }
    } else {
        GenerationError::ConnectionFailed {
            backend,
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Longest slice of an error body kept in a `Rejected` message
///
/// Servers often echo the prompt back, and the prompt carries document text.
pub(crate) const MAX_ERROR_BODY_CHARS: usize = 300;

/// Build a `Rejected` error from a non-success response
pub(crate) async fn rejected(response: reqwest::Response, backend: BackendKind) -> GenerationError {
    let status = response.status().as_u16();
    let message = truncate_error_body(&response.text().await.unwrap_or_default());
    GenerationError::Rejected {
        backend,
        status,
        message,
    }
}

fn truncate_error_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_error_body_kept_whole() {
        assert_eq!(truncate_error_body("model not loaded\n"), "model not loaded");
    }

    #[test]
    fn test_long_error_body_truncated_on_char_boundary() {
        let body = "Истец Иванов ".repeat(100);
        let message = truncate_error_body(&body);

        assert_eq!(message.chars().count(), MAX_ERROR_BODY_CHARS + 1);
        assert!(message.ends_with('…'));
        assert!(body.starts_with(message.trim_end_matches('…')));
    }
}
