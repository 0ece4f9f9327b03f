//! Clean command implementation
//!
//! This module implements the `clean` command: the full de-identification
//! pipeline over one text file.

use super::resolve_config;
use crate::deidentification::{DeidPipeline, PipelineResult, ProcessOptions};
use anyhow::Context;
use clap::Args;
use std::fs;
use std::path::PathBuf;

/// Arguments for the clean command
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Extracted document text to de-identify
    pub input: PathBuf,

    /// Write the cleaned text here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip statistical entity recognition (direct redaction by the model)
    #[arg(long)]
    pub no_ner: bool,

    /// Write the pipeline result (statistics, stages, errors) as JSON
    #[arg(long, value_name = "PATH")]
    pub stats: Option<PathBuf>,
}

impl CleanArgs {
    /// Execute the clean command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input.display(), "Starting clean command");

        let mut config = match resolve_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load configuration");
                eprintln!("   Error: {e}");
                return Ok(2);
            }
        };

        if self.no_ner {
            tracing::info!("Disabling statistical recognition from CLI");
            config.pipeline.use_statistical_recognition = false;
        }

        let pipeline = match DeidPipeline::new(&config) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("❌ Failed to build pipeline");
                eprintln!("   Error: {e}");
                return Ok(2);
            }
        };

        let text = fs::read_to_string(&self.input)
            .with_context(|| format!("Failed to read input file: {}", self.input.display()))?;

        eprintln!(
            "🔒 De-identifying {} ({} chars) with {} backend, model {}",
            self.input.display(),
            text.chars().count(),
            config.provider.kind,
            config.provider.model
        );

        let result = pipeline
            .process(&text, &ProcessOptions::from(&config.pipeline))
            .await;

        if let Some(ref stats_path) = self.stats {
            let json = serde_json::to_string_pretty(&StatsReport::from(&result))
                .context("Failed to serialize pipeline statistics")?;
            fs::write(stats_path, json)
                .with_context(|| format!("Failed to write statistics: {}", stats_path.display()))?;
        }

        print_summary(&result);

        let Some(cleaned) = result.cleaned_text.as_deref().filter(|_| result.success) else {
            return Ok(1);
        };

        match self.output {
            Some(ref path) => {
                fs::write(path, cleaned)
                    .with_context(|| format!("Failed to write output file: {}", path.display()))?;
                eprintln!("✅ Cleaned text written to {}", path.display());
            }
            None => println!("{cleaned}"),
        }

        Ok(0)
    }
}

/// Pipeline result without any document text
#[derive(serde::Serialize)]
struct StatsReport<'a> {
    run_id: String,
    success: bool,
    pipeline_used: &'a str,
    degraded: bool,
    provider: String,
    model: &'a str,
    original_length: usize,
    cleaned_length: usize,
    processing_time_ms: u64,
    stats: &'a crate::deidentification::RecognitionStats,
    stages: &'a [crate::deidentification::StageReport],
    error: Option<&'a crate::deidentification::FailureDetail>,
}

impl<'a> From<&'a PipelineResult> for StatsReport<'a> {
    fn from(result: &'a PipelineResult) -> Self {
        Self {
            run_id: result.run_id.to_string(),
            success: result.success,
            pipeline_used: result.pipeline_used.as_str(),
            degraded: result.degraded,
            provider: result.provider.to_string(),
            model: &result.model,
            original_length: result.original_length,
            cleaned_length: result.cleaned_length,
            processing_time_ms: result.processing_time_ms,
            stats: &result.stats,
            stages: &result.stages,
            error: result.error.as_ref(),
        }
    }
}

fn print_summary(result: &PipelineResult) {
    eprintln!();
    if result.success {
        eprintln!("✅ De-identification completed");
    } else {
        eprintln!("❌ De-identification failed");
    }
    eprintln!("  Pipeline: {}", result.pipeline_used);
    if result.degraded {
        eprintln!("  ⚠️  Entity recognition unavailable, ran in degraded mode");
    }
    eprintln!("  Replacements: {}", result.stats.total_replacements);
    for (category, count) in &result.stats.by_category {
        eprintln!("    {category}: {count}");
    }
    if result.stats.chunk_count > 1 {
        eprintln!("  Chunks: {}", result.stats.chunk_count);
    }
    eprintln!(
        "  Length: {} → {} chars",
        result.original_length, result.cleaned_length
    );
    eprintln!("  Time: {}ms", result.processing_time_ms);

    if let Some(ref error) = result.error {
        eprintln!("  Stage: {}", error.stage);
        if let Some(backend) = error.backend {
            eprintln!("  Backend: {backend}");
        }
        eprintln!("  Error: {}", error.message);
    }
    eprintln!();
}
