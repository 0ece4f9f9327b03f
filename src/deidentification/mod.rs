//! De-identification module for LexRedact
//!
//! This module removes personal data from Russian and Kazakh legal documents
//! before they are stored or shared.
//!
//! # Architecture
//!
//! The pipeline consists of:
//! - **Pattern recognition**: Regex detection of phones, e-mails, IDs,
//!   accounts, plates and addresses
//! - **Entity recognition**: Statistical tagging of people, organisations and
//!   places
//! - **Placeholder registry**: Per-document mapping from surface form to
//!   placeholder
//! - **Chunking**: Paragraph-aligned split for the rewriting backend
//! - **Rewriting**: Generative pass that turns placeholders into consistent
//!   fictitious values
//! - **Audit**: JSON-lines log with hashed values
//!
//! # Usage
//!
//! ```rust,ignore
//! use lexredact::deidentification::{DeidPipeline, ProcessOptions};
//!
//! let pipeline = DeidPipeline::new(&config)?;
//! let result = pipeline.process(&text, &ProcessOptions::default()).await;
//! ```

pub mod audit;
pub mod chunking;
pub mod detector;
pub mod entity;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod rewrite;

// Re-export main types
pub use audit::AuditLogger;
pub use detector::{PatternLibrary, PatternRecognizer};
pub use entity::{EntityRecognizer, EntityTagger, LexiconTagger, TaggedSpan};
pub use models::{
    DetectionMethod, EntityCategory, FailureDetail, PipelineResult, PipelineUsed,
    RecognitionOutcome, RecognitionSpan, RecognitionStats, Stage, StageReport, StageStatus,
};
pub use pipeline::{DeidPipeline, Preprocessed, ProcessOptions};
pub use registry::{Placeholder, PlaceholderRegistry, RegistryEntry};
