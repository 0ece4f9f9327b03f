//! De-identification pipeline
//!
//! This module provides the [`DeidPipeline`] that turns raw document text into
//! de-identified text.
//!
//! # Architecture
//!
//! Stages run strictly in sequence, each completing before the next starts:
//! - **Pattern recognition**: structured identifiers become placeholders
//! - **Entity recognition**: names, organisations and places become numbered
//!   placeholders (skippable, and degradable when the model is missing)
//! - **Chunking**: paragraph-aligned split with a backend-specific budget
//! - **Rewriting**: one generative call per chunk, stopping at the first failure
//! - **Aggregation**: chunk outputs joined in order, all or nothing
//!
//! Each call to [`DeidPipeline::process`] owns a fresh [`PlaceholderRegistry`];
//! nothing mutable is shared between calls, so one pipeline can serve
//! concurrent documents behind an `Arc`.
//!
//! # Examples
//!
//! ```no_run
//! use lexredact::config::DeidConfig;
//! use lexredact::deidentification::{DeidPipeline, ProcessOptions};
//!
//! # async fn example() -> lexredact::domain::Result<()> {
//! let config = DeidConfig::default();
//! let pipeline = DeidPipeline::new(&config)?;
//!
//! let result = pipeline
//!     .process("Иванов Иван Иванович, тел. +7-701-234-56-78.", &ProcessOptions::from(&config.pipeline))
//!     .await;
//!
//! if result.success {
//!     println!("{}", result.cleaned_text.unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

use crate::adapters::llm::{create_backend, GenerativeBackend, PromptTemplate, Rewriter};
use crate::config::{DeidConfig, PipelineConfig};
use crate::deidentification::audit::AuditLogger;
use crate::deidentification::chunking::{self, AggregatedOutput, ChunkOutput, OversizePolicy};
use crate::deidentification::detector::PatternRecognizer;
use crate::deidentification::entity::EntityRecognizer;
use crate::deidentification::models::{
    FailureDetail, PipelineResult, PipelineUsed, RecognitionStats, Stage, StageReport, StageStatus,
};
use crate::deidentification::registry::PlaceholderRegistry;
use crate::domain::{LexRedactError, PipelineError, Result};
use crate::{log_chunk_progress, log_error_with_context, log_stage_complete, log_stage_start};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Per-invocation switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Run the entity recognizer; when false the rewriter gets pattern-cleaned
    /// text and the direct-redaction template
    pub use_statistical_recognition: bool,

    /// Continue without entity recognition when its model is unavailable
    pub degrade_on_recognition_failure: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            use_statistical_recognition: true,
            degrade_on_recognition_failure: true,
        }
    }
}

impl From<&PipelineConfig> for ProcessOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            use_statistical_recognition: config.use_statistical_recognition,
            degrade_on_recognition_failure: config.degrade_on_recognition_failure,
        }
    }
}

/// Output of the recognition stages alone
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Placeholder-bearing text
    pub text: String,
    pub stats: RecognitionStats,
    pub stages: Vec<StageReport>,
    pub pipeline_used: PipelineUsed,
    pub degraded: bool,
}

/// State accumulated over one run
struct RunContext {
    run_id: Uuid,
    started: Instant,
    timestamp: DateTime<Utc>,
    original_length: usize,
    stages: Vec<StageReport>,
    pipeline_used: PipelineUsed,
    degraded: bool,
    occurrences: usize,
    chunk_count: usize,
    preprocessed_text: Option<String>,
}

impl RunContext {
    fn new(raw_text: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started: Instant::now(),
            timestamp: Utc::now(),
            original_length: raw_text.chars().count(),
            stages: Vec::new(),
            pipeline_used: PipelineUsed::NerAndLlm,
            degraded: false,
            occurrences: 0,
            chunk_count: 0,
            preprocessed_text: None,
        }
    }

    fn report(&mut self, stage: Stage, status: StageStatus) {
        self.stages.push(StageReport::new(stage, status));
    }

    fn report_with(&mut self, stage: Stage, status: StageStatus, detail: impl Into<String>) {
        self.stages
            .push(StageReport::new(stage, status).with_detail(detail));
    }

    fn stats(&self, registry: &PlaceholderRegistry) -> RecognitionStats {
        RecognitionStats {
            occurrences: self.occurrences,
            chunk_count: self.chunk_count,
            ..registry.stats()
        }
    }
}

/// De-identification pipeline
///
/// Holds only immutable collaborators: recognizers, the rewriter and the
/// chunking budget. Per-document state lives inside each `process` call.
pub struct DeidPipeline {
    patterns: PatternRecognizer,
    entities: EntityRecognizer,
    rewriter: Rewriter,
    max_chunk_chars: usize,
    oversize: OversizePolicy,
    audit: AuditLogger,
}

impl DeidPipeline {
    /// Create a pipeline from configuration
    ///
    /// An entity model that cannot be loaded does not fail construction; it
    /// is reported when a document is processed, where degradation applies.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The pattern library cannot be loaded or compiled
    /// - The generative backend cannot be created
    /// - The audit log directory cannot be created
    pub fn new(config: &DeidConfig) -> Result<Self> {
        config.validate().map_err(LexRedactError::Configuration)?;

        let patterns = PatternRecognizer::from_config(&config.recognition)?;
        let entities = EntityRecognizer::from_config(&config.recognition);
        let backend = create_backend(&config.provider)?;

        let audit = AuditLogger::new(config.audit.log_path.clone(), config.audit.enabled)
            .map_err(|e| LexRedactError::Io(format!("{e:#}")))?;

        Ok(Self::with_components(patterns, entities, backend, &config.pipeline).with_audit(audit))
    }

    /// Assemble a pipeline from explicit components
    pub fn with_components(
        patterns: PatternRecognizer,
        entities: EntityRecognizer,
        backend: Arc<dyn GenerativeBackend>,
        config: &PipelineConfig,
    ) -> Self {
        let max_chunk_chars = config.chunk_chars_for(backend.kind());
        let oversize = if config.split_oversized_paragraphs {
            OversizePolicy::SplitSentences
        } else {
            OversizePolicy::KeepWhole
        };

        Self {
            patterns,
            entities,
            rewriter: Rewriter::new(backend),
            max_chunk_chars,
            oversize,
            audit: AuditLogger::disabled(),
        }
    }

    /// Record every processed document in `audit`
    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = audit;
        self
    }

    pub fn backend(&self) -> &Arc<dyn GenerativeBackend> {
        self.rewriter.backend()
    }

    pub fn max_chunk_chars(&self) -> usize {
        self.max_chunk_chars
    }

    pub fn entity_recognition_available(&self) -> bool {
        self.entities.is_available()
    }

    /// Run only the recognition stages; no model is called
    ///
    /// # Errors
    ///
    /// Returns `RecognitionUnavailable` when the entity model is missing and
    /// degradation is disabled.
    pub fn preprocess(
        &self,
        raw_text: &str,
        options: &ProcessOptions,
    ) -> std::result::Result<Preprocessed, PipelineError> {
        let mut registry = PlaceholderRegistry::new();
        let mut ctx = RunContext::new(raw_text);
        let text = self.recognize(raw_text, options, &mut registry, &mut ctx)?;

        Ok(Preprocessed {
            text,
            stats: ctx.stats(&registry),
            stages: ctx.stages,
            pipeline_used: ctx.pipeline_used,
            degraded: ctx.degraded,
        })
    }

    /// De-identify one document
    ///
    /// Never returns an error: every failure is reported in the result with
    /// `success = false` and a [`FailureDetail`] naming the stage and backend.
    pub async fn process(&self, raw_text: &str, options: &ProcessOptions) -> PipelineResult {
        let mut registry = PlaceholderRegistry::new();
        let mut ctx = RunContext::new(raw_text);

        tracing::info!(
            run_id = %ctx.run_id,
            input_chars = ctx.original_length,
            backend = %self.rewriter.backend_kind(),
            "De-identification started"
        );

        let text = match self.recognize(raw_text, options, &mut registry, &mut ctx) {
            Ok(text) => text,
            Err(e) => return self.finish(ctx, &registry, Err((Stage::EntityRecognition, e))),
        };

        let outcome = self.rewrite_document(&text, &mut ctx).await;
        self.finish(ctx, &registry, outcome)
    }

    /// Pattern then entity recognition over a shared registry
    fn recognize(
        &self,
        raw_text: &str,
        options: &ProcessOptions,
        registry: &mut PlaceholderRegistry,
        ctx: &mut RunContext,
    ) -> std::result::Result<String, PipelineError> {
        log_stage_start!(Stage::PatternRecognition.as_str(), ctx.original_length);
        let stage_start = Instant::now();
        let pattern = self.patterns.recognize(raw_text, registry);
        ctx.occurrences += pattern.spans.len();
        ctx.report(Stage::PatternRecognition, StageStatus::Completed);
        log_stage_complete!(
            Stage::PatternRecognition.as_str(),
            pattern.spans.len(),
            stage_start.elapsed()
        );

        if !options.use_statistical_recognition {
            ctx.pipeline_used = PipelineUsed::LlmOnly;
            ctx.report_with(Stage::EntityRecognition, StageStatus::Skipped, "disabled");
            return Ok(pattern.text);
        }

        log_stage_start!(Stage::EntityRecognition.as_str(), pattern.text.chars().count());
        let stage_start = Instant::now();
        match self.entities.recognize(&pattern.text, registry) {
            Ok(outcome) => {
                ctx.occurrences += outcome.spans.len();
                ctx.pipeline_used = PipelineUsed::NerAndLlm;
                ctx.report(Stage::EntityRecognition, StageStatus::Completed);
                log_stage_complete!(
                    Stage::EntityRecognition.as_str(),
                    outcome.spans.len(),
                    stage_start.elapsed()
                );
                ctx.preprocessed_text = Some(outcome.text.clone());
                Ok(outcome.text)
            }
            Err(e) if options.degrade_on_recognition_failure => {
                tracing::warn!(
                    run_id = %ctx.run_id,
                    error = %e,
                    "Entity recognition unavailable, continuing with pattern-cleaned text"
                );
                ctx.pipeline_used = PipelineUsed::LlmOnly;
                ctx.degraded = true;
                ctx.report_with(Stage::EntityRecognition, StageStatus::Degraded, e.to_string());
                Ok(pattern.text)
            }
            Err(e) => {
                ctx.report_with(Stage::EntityRecognition, StageStatus::Failed, e.to_string());
                Err(PipelineError::RecognitionUnavailable(e))
            }
        }
    }

    /// Chunk, rewrite sequentially and aggregate
    async fn rewrite_document(
        &self,
        text: &str,
        ctx: &mut RunContext,
    ) -> std::result::Result<AggregatedOutput, (Stage, PipelineError)> {
        let template = match ctx.pipeline_used {
            PipelineUsed::NerAndLlm => PromptTemplate::Finalization,
            PipelineUsed::LlmOnly => PromptTemplate::DirectRedaction,
        };

        if text.trim().is_empty() {
            ctx.report_with(Stage::Chunking, StageStatus::Skipped, "empty input");
            ctx.report_with(Stage::Rewriting, StageStatus::Skipped, "empty input");
            ctx.report(Stage::Aggregation, StageStatus::Skipped);
            return Ok(AggregatedOutput {
                text: String::new(),
                original_chars: 0,
                cleaned_chars: 0,
                chunk_count: 0,
            });
        }

        let chunks = chunking::split_with_policy(text, self.max_chunk_chars, self.oversize);
        let total = chunks.len();
        ctx.chunk_count = total;
        if total > 1 {
            ctx.report_with(Stage::Chunking, StageStatus::Completed, format!("{total} chunks"));
        } else {
            ctx.report_with(Stage::Chunking, StageStatus::Skipped, "fits in one chunk");
        }

        log_stage_start!(Stage::Rewriting.as_str(), text.chars().count());
        let stage_start = Instant::now();
        let mut results = Vec::with_capacity(total);

        for (index, chunk) in chunks.iter().enumerate() {
            let chunk_chars = chunk.chars().count();
            if total > 1 {
                log_chunk_progress!(index + 1, total, chunk_chars);
            }

            let outcome = self
                .rewriter
                .rewrite(chunk, template)
                .await
                .map(|cleaned_text| ChunkOutput {
                    original_chars: chunk_chars,
                    cleaned_text,
                });

            let failed = outcome.is_err();
            results.push(outcome);
            if failed {
                tracing::warn!(
                    run_id = %ctx.run_id,
                    chunk = index + 1,
                    total,
                    "Chunk rewrite failed, remaining chunks not sent"
                );
                break;
            }
        }

        let rewrite_failed = results.last().is_some_and(|r| r.is_err());
        if rewrite_failed {
            ctx.report(Stage::Rewriting, StageStatus::Failed);
        } else {
            ctx.report(Stage::Rewriting, StageStatus::Completed);
            log_stage_complete!(Stage::Rewriting.as_str(), total, stage_start.elapsed());
        }

        match chunking::aggregate(results, total) {
            Ok(output) => {
                ctx.report(Stage::Aggregation, StageStatus::Completed);
                Ok(output)
            }
            Err(e) => {
                ctx.report_with(Stage::Aggregation, StageStatus::Failed, "no partial result kept");
                let stage = if rewrite_failed {
                    Stage::Rewriting
                } else {
                    Stage::Aggregation
                };
                Err((stage, e))
            }
        }
    }

    /// Build the result, log it and write the audit entry
    fn finish(
        &self,
        ctx: RunContext,
        registry: &PlaceholderRegistry,
        outcome: std::result::Result<AggregatedOutput, (Stage, PipelineError)>,
    ) -> PipelineResult {
        let stats = ctx.stats(registry);
        let processing_time_ms = ctx.started.elapsed().as_millis() as u64;
        let backend = self.rewriter.backend();

        let (success, cleaned_text, cleaned_length, error) = match outcome {
            Ok(output) => (true, Some(output.text), output.cleaned_chars, None),
            Err((stage, e)) => {
                log_error_with_context!(&e, stage.as_str());
                (false, None, 0, Some(FailureDetail::from_pipeline_error(stage, &e)))
            }
        };

        let result = PipelineResult {
            run_id: ctx.run_id,
            timestamp: ctx.timestamp,
            success,
            cleaned_text,
            preprocessed_text: ctx.preprocessed_text,
            original_length: ctx.original_length,
            cleaned_length,
            stats,
            stages: ctx.stages,
            pipeline_used: ctx.pipeline_used,
            degraded: ctx.degraded,
            provider: backend.kind(),
            model: backend.model().to_string(),
            processing_time_ms,
            error,
        };

        tracing::info!(
            run_id = %result.run_id,
            success = result.success,
            pipeline_used = %result.pipeline_used,
            degraded = result.degraded,
            replacements = result.stats.total_replacements,
            chunks = result.stats.chunk_count,
            duration_ms = result.processing_time_ms,
            "De-identification finished"
        );

        if let Err(e) = self.audit.log_document(&result, registry.entries()) {
            tracing::warn!(run_id = %result.run_id, error = %e, "Failed to write audit entry");
        }

        result
    }
}
