//! Generative model backends
//!
//! This module provides the rewriting stage's connection to a language model.
//! The `GenerativeBackend` trait defines the common interface; [`LocalBackend`]
//! (a locally hosted model server) and [`RemoteBackend`] (a chat-completion
//! API) implement it, and [`create_backend`] picks one from configuration.

mod backend;
pub mod local;
pub mod prompt;
pub mod remote;
pub mod rewriter;

pub use backend::{ConnectionStatus, GenerativeBackend};
pub use local::LocalBackend;
pub use prompt::PromptTemplate;
pub use remote::RemoteBackend;
pub use rewriter::Rewriter;

use crate::config::ProviderConfig;
use crate::domain::{BackendKind, Result};
use std::sync::Arc;

/// Create the backend selected by `config.kind`
///
/// # Errors
///
/// Returns a configuration error if the remote backend is selected without a
/// base URL or API key, or if the HTTP client cannot be built.
pub fn create_backend(config: &ProviderConfig) -> Result<Arc<dyn GenerativeBackend>> {
    let backend: Arc<dyn GenerativeBackend> = match config.kind {
        BackendKind::Local => Arc::new(LocalBackend::new(config)?),
        BackendKind::Remote => Arc::new(RemoteBackend::new(config)?),
    };

    tracing::info!(
        backend = %backend.kind(),
        endpoint = backend.endpoint(),
        model = backend.model(),
        "Generative backend configured"
    );

    Ok(backend)
}
