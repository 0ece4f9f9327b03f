//! Locally hosted model backend
//!
//! Talks to an Ollama-compatible server: `POST /api/generate` for completions
//! and `GET /api/tags` to list installed models.

use super::backend::{rejected, transport_error, ConnectionStatus, GenerativeBackend};
use crate::config::ProviderConfig;
use crate::domain::{BackendKind, GenerationError, LexRedactError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CHECK_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    /// -1 lets the model write until it stops
    num_predict: i32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    #[serde(default)]
    name: String,
}

/// Local model backend
///
/// Local inference is slow, so the default request timeout is generous
/// (300 s) compared to the remote backend.
pub struct LocalBackend {
    /// Base URL of the model server, without a trailing slash
    base_url: String,

    model: String,
    temperature: f32,
    timeout_secs: u64,
    client: Client,
}

impl LocalBackend {
    /// Create a local backend from provider configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let timeout_secs = config.effective_timeout_seconds();
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| LexRedactError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.local_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout_secs,
            client,
        })
    }
}

#[async_trait]
impl GenerativeBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: -1,
            },
        };

        tracing::debug!(
            backend = "local",
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "Sending generation request"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, BackendKind::Local, &self.base_url, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(rejected(response, BackendKind::Local).await);
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| transport_error(e, BackendKind::Local, &self.base_url, self.timeout_secs))?;

        match body.response {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(GenerationError::EmptyResponse {
                backend: BackendKind::Local,
                model: self.model.clone(),
            }),
        }
    }

    async fn check_connection(&self) -> std::result::Result<ConnectionStatus, GenerationError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(CHECK_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| transport_error(e, BackendKind::Local, &self.base_url, CHECK_TIMEOUT_SECS))?;

        if !response.status().is_success() {
            return Err(rejected(response, BackendKind::Local).await);
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| transport_error(e, BackendKind::Local, &self.base_url, CHECK_TIMEOUT_SECS))?;

        let available_models: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
        // Installed names carry a tag suffix ("llama3:latest")
        let model_available = available_models.iter().any(|m| m.contains(&self.model));

        tracing::info!(
            backend = "local",
            models = available_models.len(),
            model_available,
            "Local model server reachable"
        );

        Ok(ConnectionStatus {
            connected: true,
            model_available,
            available_models,
            requested_model: self.model.clone(),
        })
    }
}
