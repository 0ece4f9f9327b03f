// LexRedact - De-identification of Russian and Kazakh legal documents
// Copyright (c) 2025 LexRedact Contributors
// Licensed under the MIT License

use clap::Parser;
use lexredact::cli::commands::resolve_config;
use lexredact::cli::{Cli, Commands};
use lexredact::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logging settings come from the configuration when it loads; a broken
    // configuration is reported by the command itself, so fall back to defaults
    let config = resolve_config(&cli.config).unwrap_or_default();
    let log_level = cli.effective_log_level(&config);
    let _guard = match init_logging(log_level, &config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "LexRedact - legal document de-identification"
    );

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5 // Fatal error exit code
        }
    };

    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Clean(args) => args.execute(&cli.config).await,
        Commands::Preprocess(args) => args.execute(&cli.config).await,
        Commands::CheckModel(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
