//! Remote chat-completion backend
//!
//! Speaks the OpenAI-compatible `POST {base_url}/chat/completions` protocol
//! with bearer-token authentication.

use super::backend::{rejected, transport_error, ConnectionStatus, GenerativeBackend};
use crate::config::{ProviderConfig, SecretString};
use crate::domain::{BackendKind, GenerationError, LexRedactError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Token budget for the connection check; the smallest most providers accept
const CHECK_MAX_TOKENS: u32 = 16;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Remote model backend
pub struct RemoteBackend {
    /// Base URL of the API, without a trailing slash
    base_url: String,

    api_key: SecretString,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout_secs: u64,
    client: Client,
}

impl RemoteBackend {
    /// Create a remote backend from provider configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or API key is missing, or if the HTTP
    /// client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let base_url = config.base_url.as_deref().ok_or_else(|| {
            LexRedactError::Configuration("provider.base_url is required for the remote backend".to_string())
        })?;
        let api_key = config.api_key.clone().ok_or_else(|| {
            LexRedactError::Configuration("provider.api_key is required for the remote backend".to_string())
        })?;

        let timeout_secs = config.effective_timeout_seconds();
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LexRedactError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs,
            client,
        })
    }

    async fn complete(
        &self,
        content: &str,
        max_tokens: u32,
    ) -> std::result::Result<Option<String>, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            temperature: self.temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, BackendKind::Remote, &self.base_url, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(rejected(response, BackendKind::Remote).await);
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| transport_error(e, BackendKind::Remote, &self.base_url, self.timeout_secs))?;

        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

#[async_trait]
impl GenerativeBackend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        tracing::debug!(
            backend = "remote",
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "Sending chat completion request"
        );

        match self.complete(prompt, self.max_tokens).await? {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(GenerationError::EmptyResponse {
                backend: BackendKind::Remote,
                model: self.model.clone(),
            }),
        }
    }

    async fn check_connection(&self) -> std::result::Result<ConnectionStatus, GenerationError> {
        self.complete("Test", CHECK_MAX_TOKENS).await?;

        tracing::info!(backend = "remote", model = %self.model, "Remote model reachable");

        Ok(ConnectionStatus {
            connected: true,
            model_available: true,
            available_models: Vec::new(),
            requested_model: self.model.clone(),
        })
    }
}
