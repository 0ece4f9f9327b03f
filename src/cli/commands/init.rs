//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

const EXAMPLE_CONFIG: &str = include_str!("../../../lexredact.example.toml");

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "lexredact.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing LexRedact configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            EXAMPLE_CONFIG
        } else {
            Self::minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. For a local model: start the model server and pull the model");
                println!("  3. For a remote model: set provider.kind = \"remote\", base_url,");
                println!("     and LEXREDACT_PROVIDER_API_KEY in .env");
                println!("  4. Validate configuration: lexredact validate-config");
                println!("  5. Check the model: lexredact check-model");
                println!("  6. Clean a document: lexredact clean case.txt --output case.clean.txt");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    fn minimal_config() -> &'static str {
        r#"# LexRedact Configuration File

[application]
log_level = "info"

[provider]
kind = "local"   # local | remote
model = "llama3"
temperature = 0.1
local_url = "http://localhost:11434"
# base_url = "https://openrouter.ai/api/v1"
# api_key = "${LEXREDACT_PROVIDER_API_KEY}"

[pipeline]
use_statistical_recognition = true
degrade_on_recognition_failure = true
local_chunk_chars = 8000
remote_chunk_chars = 12000

[audit]
enabled = false
log_path = "./audit/deidentification.log"

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
    }
}
