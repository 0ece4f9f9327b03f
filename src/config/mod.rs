//! Configuration management for LexRedact.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! LexRedact uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `LEXREDACT_<SECTION>_<KEY>` overrides
//! - Default values for every setting
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lexredact::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("lexredact.toml")?;
//!
//! println!("Backend: {}", config.provider.kind);
//! println!("Model: {}", config.provider.model);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`ProviderConfig`] - Generative backend selection and connection
//! - [`PipelineConfig`] - Recognition toggles and chunk budgets
//! - [`RecognitionConfig`] - Pattern library and entity model
//! - [`AuditConfig`] - Replacement audit log
//! - [`LoggingConfig`] - File logging
//!
//! # Example Configuration
//!
//! ```toml
//! [provider]
//! kind = "remote"
//! model = "openai/gpt-4o-mini"
//! base_url = "https://openrouter.ai/api/v1"
//! api_key = "${OPENROUTER_API_KEY}"
//!
//! [pipeline]
//! use_statistical_recognition = true
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_from_env};
pub use schema::{
    ApplicationConfig, AuditConfig, DeidConfig, LoggingConfig, PipelineConfig, ProviderConfig,
    RecognitionConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
