//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for LexRedact using clap.

pub mod commands;

use crate::config::DeidConfig;
use clap::{Parser, Subcommand};

/// LexRedact - de-identification of Russian/Kazakh legal documents
#[derive(Parser, Debug)]
#[command(name = "lexredact")]
#[command(version, about, long_about = None)]
#[command(author = "LexRedact Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "lexredact.toml", env = "LEXREDACT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "LEXREDACT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log level from `--log-level`, else from `[application].log_level`
    pub fn effective_log_level<'a>(&'a self, config: &'a DeidConfig) -> &'a str {
        self.log_level
            .as_deref()
            .unwrap_or(config.application.log_level.as_str())
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// De-identify a document with the full pipeline
    Clean(commands::clean::CleanArgs),

    /// Run only the recognition stages and print the placeholder text
    Preprocess(commands::preprocess::PreprocessArgs),

    /// Check that the configured model backend is reachable
    CheckModel(commands::check::CheckArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
