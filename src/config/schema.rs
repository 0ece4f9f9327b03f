//! Configuration schema types
//!
//! This module defines the configuration structure for LexRedact. Every
//! section has defaults so a minimal file only needs to name the provider.

use crate::config::SecretString;
use crate::domain::BackendKind;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main LexRedact configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeidConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Generative backend selection and connection settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Pipeline behaviour (recognition toggles, chunk budgets)
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Recognizer resources (pattern library, entity model)
    #[serde(default)]
    pub recognition: RecognitionConfig,

    /// Audit log of replacements
    #[serde(default)]
    pub audit: AuditConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DeidConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.provider.validate()?;
        self.pipeline.validate()?;
        self.recognition.validate()?;
        self.audit.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Generative backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Which backend to use: "local" or "remote"
    #[serde(default = "default_provider_kind")]
    pub kind: BackendKind,

    /// Model identifier passed to the backend
    #[serde(default = "default_model")]
    pub model: String,

    /// Generation temperature (kept low to bias toward determinism)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds; defaults depend on the backend kind
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// URL of the locally hosted model server
    #[serde(default = "default_local_url")]
    pub local_url: String,

    /// Base URL of the remote chat-completion API
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key for the remote backend
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Maximum tokens requested from the remote backend
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_seconds: None,
            local_url: default_local_url(),
            base_url: None,
            api_key: None,
            max_tokens: default_max_tokens(),
        }
    }
}

impl ProviderConfig {
    /// Effective request timeout for the selected backend
    pub fn effective_timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(match self.kind {
            BackendKind::Local => 300,
            BackendKind::Remote => 120,
        })
    }

    /// Endpoint the selected backend will be addressed at
    pub fn endpoint(&self) -> Option<&str> {
        match self.kind {
            BackendKind::Local => Some(self.local_url.as_str()),
            BackendKind::Remote => self.base_url.as_deref(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("provider.model cannot be empty".to_string());
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "provider.temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            ));
        }

        if self.timeout_seconds == Some(0) {
            return Err("provider.timeout_seconds must be > 0".to_string());
        }

        match self.kind {
            BackendKind::Local => validate_http_url("provider.local_url", &self.local_url)?,
            BackendKind::Remote => {
                let base_url = self
                    .base_url
                    .as_deref()
                    .ok_or("provider.base_url is required when provider.kind = 'remote'")?;
                validate_http_url("provider.base_url", base_url)?;

                let has_key = self
                    .api_key
                    .as_ref()
                    .is_some_and(|key| !key.expose_secret().is_blank());
                if !has_key {
                    return Err(
                        "provider.api_key is required when provider.kind = 'remote'".to_string()
                    );
                }

                if self.max_tokens == 0 {
                    return Err("provider.max_tokens must be > 0".to_string());
                }
            }
        }

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<(), String> {
    let parsed = url::Url::parse(value).map_err(|e| format!("{field} is not a valid URL: {e}"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(format!(
            "{field} must use http or https, got '{}'",
            parsed.scheme()
        ));
    }
    Ok(())
}

/// Pipeline behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Run the statistical entity recognizer before rewriting
    #[serde(default = "default_true")]
    pub use_statistical_recognition: bool,

    /// Continue with pattern-only text when the entity model is unavailable
    #[serde(default = "default_true")]
    pub degrade_on_recognition_failure: bool,

    /// Chunk budget (characters) for the local backend
    #[serde(default = "default_local_chunk_chars")]
    pub local_chunk_chars: usize,

    /// Chunk budget (characters) for the remote backend
    #[serde(default = "default_remote_chunk_chars")]
    pub remote_chunk_chars: usize,

    /// Split paragraphs larger than the budget at sentence boundaries
    #[serde(default)]
    pub split_oversized_paragraphs: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            use_statistical_recognition: true,
            degrade_on_recognition_failure: true,
            local_chunk_chars: default_local_chunk_chars(),
            remote_chunk_chars: default_remote_chunk_chars(),
            split_oversized_paragraphs: false,
        }
    }
}

impl PipelineConfig {
    /// Chunk budget for the given backend
    pub fn chunk_chars_for(&self, kind: BackendKind) -> usize {
        match kind {
            BackendKind::Local => self.local_chunk_chars,
            BackendKind::Remote => self.remote_chunk_chars,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.local_chunk_chars == 0 {
            return Err("pipeline.local_chunk_chars must be > 0".to_string());
        }
        if self.remote_chunk_chars == 0 {
            return Err("pipeline.remote_chunk_chars must be > 0".to_string());
        }
        Ok(())
    }
}

/// Recognizer resources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Path to a pattern library TOML file (embedded library when unset)
    #[serde(default)]
    pub pattern_library: Option<PathBuf>,

    /// Path to an entity model TOML file (embedded model when unset)
    #[serde(default)]
    pub entity_model: Option<PathBuf>,

    /// Locations shorter than this many characters are not replaced
    #[serde(default = "default_min_location_chars")]
    pub min_location_chars: usize,

    /// Generic place nouns that are never replaced on their own
    #[serde(default = "default_location_stoplist")]
    pub location_stoplist: Vec<String>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            pattern_library: None,
            entity_model: None,
            min_location_chars: default_min_location_chars(),
            location_stoplist: default_location_stoplist(),
        }
    }
}

impl RecognitionConfig {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref path) = self.pattern_library {
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                return Err(format!(
                    "recognition.pattern_library must be a TOML file: {}",
                    path.display()
                ));
            }
            if !path.exists() {
                return Err(format!(
                    "recognition.pattern_library not found: {}",
                    path.display()
                ));
            }
        }
        // A missing entity model is reported at recognition time so the
        // pipeline can degrade instead of refusing to start.
        Ok(())
    }
}

/// Audit logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable audit logging
    #[serde(default)]
    pub enabled: bool,

    /// Audit log file path (JSON lines)
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: default_audit_log_path(),
        }
    }
}

impl AuditConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.log_path.as_os_str().is_empty() {
            return Err("audit.log_path cannot be empty when audit is enabled".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when file logging is enabled".to_string());
        }
        Ok(())
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_provider_kind() -> BackendKind {
    BackendKind::Local
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_local_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_max_tokens() -> u32 {
    16000
}

fn default_true() -> bool {
    true
}

fn default_local_chunk_chars() -> usize {
    8000
}

fn default_remote_chunk_chars() -> usize {
    12000
}

fn default_min_location_chars() -> usize {
    4
}

fn default_location_stoplist() -> Vec<String> {
    ["город", "село", "район", "область", "қала", "ауыл", "аудан", "облыс"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("./audit/deidentification.log")
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
