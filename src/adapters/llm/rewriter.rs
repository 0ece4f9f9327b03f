//! Generative rewriter
//!
//! Wraps a [`GenerativeBackend`] with the instruction templates: one call per
//! piece of text, output trimmed, no retries.

use super::backend::GenerativeBackend;
use super::prompt::PromptTemplate;
use crate::domain::{BackendKind, GenerationError};
use std::sync::Arc;

/// Rewrites placeholder-bearing text through a generative backend
#[derive(Clone)]
pub struct Rewriter {
    backend: Arc<dyn GenerativeBackend>,
}

impl Rewriter {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn GenerativeBackend> {
        &self.backend
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Rewrite `text` under `template`
    ///
    /// # Errors
    ///
    /// Propagates the backend's [`GenerationError`] unchanged. A response that
    /// is blank after trimming is reported as `EmptyResponse`.
    pub async fn rewrite(
        &self,
        text: &str,
        template: PromptTemplate,
    ) -> Result<String, GenerationError> {
        let prompt = template.render(text);
        let output = self.backend.generate(&prompt).await?;
        let cleaned = output.trim();

        if cleaned.is_empty() {
            return Err(GenerationError::EmptyResponse {
                backend: self.backend.kind(),
                model: self.backend.model().to_string(),
            });
        }

        tracing::debug!(
            backend = %self.backend.kind(),
            input_chars = text.chars().count(),
            output_chars = cleaned.chars().count(),
            "Rewrite completed"
        );

        Ok(cleaned.to_string())
    }
}
