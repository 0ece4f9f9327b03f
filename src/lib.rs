// LexRedact - De-identification of Russian and Kazakh legal documents
// Copyright (c) 2025 LexRedact Contributors
// Licensed under the MIT License

//! # LexRedact - Legal Document De-identification
//!
//! LexRedact removes personal data from Russian and Kazakh legal documents
//! (court decisions, case files) while keeping them readable for legal review.
//!
//! ## Overview
//!
//! A document passes through a fixed sequence of stages:
//! - **Pattern recognition**: phones, e-mails, INN/BIN/SNILS, passports,
//!   vehicle plates, accounts, cards and addresses become placeholders
//! - **Entity recognition**: person, organisation and place names become
//!   numbered placeholders such as `[ЛИЦО-1]`
//! - **Chunking**: the text is split on paragraph boundaries to fit the
//!   model's context
//! - **Rewriting**: a local or remote generative model turns the placeholder
//!   text into fluent anonymized prose
//! - **Aggregation**: chunk outputs are joined back into one document
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`deidentification`] - Recognizers, placeholder registry, chunking and the pipeline
//! - [`adapters`] - Generative model backends and prompt templates
//! - [`domain`] - Error taxonomy and result types
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lexredact::config::load_config;
//! use lexredact::deidentification::{DeidPipeline, ProcessOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("lexredact.toml")?;
//!     let pipeline = DeidPipeline::new(&config)?;
//!
//!     let text = std::fs::read_to_string("decision.txt")?;
//!     let result = pipeline
//!         .process(&text, &ProcessOptions::from(&config.pipeline))
//!         .await;
//!
//!     match (result.success, result.cleaned_text) {
//!         (true, Some(cleaned)) => println!("{cleaned}"),
//!         _ => eprintln!("Failed: {:?}", result.error),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Preprocessing Only
//!
//! The deterministic stages can run without any model:
//!
//! ```rust,no_run
//! use lexredact::config::DeidConfig;
//! use lexredact::deidentification::{DeidPipeline, ProcessOptions};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = DeidPipeline::new(&DeidConfig::default())?;
//! let pre = pipeline.preprocess("Тел. +7-701-234-56-78", &ProcessOptions::default())?;
//!
//! assert_eq!(pre.text, "Тел. [ТЕЛЕФОН]");
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Setup errors use [`domain::LexRedactError`]. Processing never returns an
//! error: [`deidentification::DeidPipeline::process`] reports failures in the
//! returned result with a [`domain::FailureKind`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod deidentification;
pub mod domain;
pub mod logging;
