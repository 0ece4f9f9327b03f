//! Check-model command implementation
//!
//! Checks the configured generative backend.

use super::resolve_config;
use crate::adapters::llm::create_backend;
use clap::Args;

/// Arguments for the check-model command
#[derive(Args, Debug)]
pub struct CheckArgs {}

impl CheckArgs {
    /// Execute the check-model command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match resolve_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let backend = match create_backend(&config.provider) {
            Ok(b) => b,
            Err(e) => {
                println!("❌ Failed to configure backend");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!(
            "🔍 Checking {} backend at {}",
            backend.kind(),
            backend.endpoint()
        );
        println!();

        match backend.check_connection().await {
            Ok(status) if status.model_available => {
                println!("✅ Backend reachable, model '{}' available", status.requested_model);
                if !status.available_models.is_empty() {
                    println!("  Installed models: {}", status.available_models.join(", "));
                }
                Ok(0)
            }
            Ok(status) => {
                println!("⚠️  Backend reachable but model '{}' not found", status.requested_model);
                if !status.available_models.is_empty() {
                    println!("  Installed models: {}", status.available_models.join(", "));
                }
                Ok(1)
            }
            Err(e) => {
                tracing::error!(error = %e, "Backend connection check failed");
                println!("❌ Backend check failed");
                println!("   Error: {e}");
                Ok(4)
            }
        }
    }
}
