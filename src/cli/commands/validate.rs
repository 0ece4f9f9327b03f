//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the LexRedact configuration file.

use crate::config::load_config;
use crate::domain::BackendKind;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config also validates
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Backend: {}", config.provider.kind);
        println!("  Model: {}", config.provider.model);
        println!("  Endpoint: {}", config.provider.endpoint().unwrap_or("-"));
        if config.provider.kind == BackendKind::Remote {
            println!("  API Key: configured");
        }
        println!("  Temperature: {}", config.provider.temperature);
        println!("  Timeout: {}s", config.provider.effective_timeout_seconds());
        println!(
            "  Entity Recognition: {}",
            if config.pipeline.use_statistical_recognition {
                "enabled"
            } else {
                "disabled"
            }
        );
        println!(
            "  Chunk Budget: {} chars",
            config.pipeline.chunk_chars_for(config.provider.kind)
        );
        println!(
            "  Pattern Library: {}",
            config
                .recognition
                .pattern_library
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string())
        );
        println!(
            "  Entity Model: {}",
            config
                .recognition
                .entity_model
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string())
        );
        println!(
            "  Audit Log: {}",
            if config.audit.enabled {
                config.audit.log_path.display().to_string()
            } else {
                "disabled".to_string()
            }
        );
        println!();
        Ok(0)
    }
}
