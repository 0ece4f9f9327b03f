//! Preprocess command implementation
//!
//! Runs pattern and entity recognition only, without calling a model. Useful
//! for checking what the recognizers catch before text leaves the machine.

use super::resolve_config;
use crate::config::ProviderConfig;
use crate::deidentification::{DeidPipeline, ProcessOptions};
use anyhow::Context;
use clap::Args;
use std::fs;
use std::path::PathBuf;

/// Arguments for the preprocess command
#[derive(Args, Debug)]
pub struct PreprocessArgs {
    /// Extracted document text
    pub input: PathBuf,

    /// Skip statistical entity recognition
    #[arg(long)]
    pub no_ner: bool,
}

impl PreprocessArgs {
    /// Execute the preprocess command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let mut config = match resolve_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load configuration");
                eprintln!("   Error: {e}");
                return Ok(2);
            }
        };

        if self.no_ner {
            config.pipeline.use_statistical_recognition = false;
        }
        // No model is called, so any provider settings will do
        config.provider = ProviderConfig::default();

        let pipeline = match DeidPipeline::new(&config) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("❌ Failed to build recognizers");
                eprintln!("   Error: {e}");
                return Ok(2);
            }
        };

        let text = fs::read_to_string(&self.input)
            .with_context(|| format!("Failed to read input file: {}", self.input.display()))?;

        match pipeline.preprocess(&text, &ProcessOptions::from(&config.pipeline)) {
            Ok(pre) => {
                println!("{}", pre.text);

                eprintln!();
                eprintln!("✅ Recognition completed ({})", pre.pipeline_used);
                if pre.degraded {
                    eprintln!("  ⚠️  Entity recognition unavailable, pattern results only");
                }
                eprintln!(
                    "  Replacements: {} ({} pattern, {} statistical, {} occurrences)",
                    pre.stats.total_replacements,
                    pre.stats.pattern_replacements,
                    pre.stats.statistical_replacements,
                    pre.stats.occurrences
                );
                for (category, count) in &pre.stats.by_category {
                    eprintln!("    {category}: {count}");
                }
                Ok(0)
            }
            Err(e) => {
                eprintln!("❌ Recognition failed");
                eprintln!("   Error: {e}");
                Ok(1)
            }
        }
    }
}
