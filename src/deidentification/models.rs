//! De-identification data models

use crate::domain::{BackendKind, FailureKind, PipelineError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Category of a detected sensitive span
///
/// Variant order is the canonical pattern-pass order followed by the
/// statistical categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityCategory {
    /// Telephone numbers
    Phone,
    /// E-mail addresses
    Email,
    /// Personal tax identifiers (ИНН, ИИН)
    TaxId,
    /// Business identifiers (БИН, БИК)
    BusinessId,
    /// Social insurance numbers (СНИЛС)
    SocialId,
    /// Passport and identity card numbers
    Passport,
    /// Vehicle registration plates
    LicensePlate,
    /// Bank account numbers and IBANs
    BankAccount,
    /// Payment card numbers
    CardNumber,
    /// Street addresses
    Address,
    /// Person names
    Person,
    /// Organisation names
    Organization,
    /// Geographic entities
    Location,
}

impl EntityCategory {
    /// Short tag used inside placeholders
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Phone => "ТЕЛЕФОН",
            Self::Email => "EMAIL",
            Self::TaxId => "ИНН",
            Self::BusinessId => "БИН",
            Self::SocialId => "СНИЛС",
            Self::Passport => "ПАСПОРТ",
            Self::LicensePlate => "ГОСНОМЕР",
            Self::BankAccount => "СЧЕТ",
            Self::CardNumber => "КАРТА",
            Self::Address => "АДРЕС",
            Self::Person => "ЛИЦО",
            Self::Organization => "ОРГ",
            Self::Location => "ГЕО",
        }
    }

    /// Whether placeholders for this category carry a per-document number
    ///
    /// Flat categories share one generic tag for every occurrence.
    pub fn is_numbered(&self) -> bool {
        matches!(
            self,
            Self::Address | Self::Person | Self::Organization | Self::Location
        )
    }

    /// Whether this category is produced by the statistical recognizer
    pub fn is_statistical(&self) -> bool {
        matches!(self, Self::Person | Self::Organization | Self::Location)
    }

    /// Parse a library/model label (`PHONE`, `TAX_ID`, `PER`, `GPE` ...)
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_uppercase().as_str() {
            "PHONE" => Some(Self::Phone),
            "EMAIL" => Some(Self::Email),
            "TAX_ID" | "INN" => Some(Self::TaxId),
            "BUSINESS_ID" | "BIN" => Some(Self::BusinessId),
            "SOCIAL_ID" | "SNILS" => Some(Self::SocialId),
            "PASSPORT" => Some(Self::Passport),
            "LICENSE_PLATE" => Some(Self::LicensePlate),
            "BANK_ACCOUNT" => Some(Self::BankAccount),
            "CARD_NUMBER" | "CARD" => Some(Self::CardNumber),
            "ADDRESS" => Some(Self::Address),
            "PERSON" | "PER" => Some(Self::Person),
            "ORGANIZATION" | "ORG" => Some(Self::Organization),
            "LOCATION" | "LOC" | "GPE" | "GEO" => Some(Self::Location),
            _ => None,
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// How a span was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionMethod {
    /// Deterministic regular expression
    Pattern,
    /// Statistical entity model
    Statistical,
}

/// A detected sensitive-data occurrence
///
/// Offsets are byte offsets into the text of the recognition pass that
/// produced the span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionSpan {
    pub start: usize,
    pub end: usize,
    pub surface: String,
    pub category: EntityCategory,
    pub method: DetectionMethod,
}

impl RecognitionSpan {
    pub fn new(
        start: usize,
        end: usize,
        surface: impl Into<String>,
        category: EntityCategory,
        method: DetectionMethod,
    ) -> Self {
        Self {
            start,
            end,
            surface: surface.into(),
            category,
            method,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn overlaps(&self, other: &RecognitionSpan) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Output of one recognizer over a text
#[derive(Debug, Clone, Default)]
pub struct RecognitionOutcome {
    /// Text with every recognized span replaced by its placeholder
    pub text: String,
    /// Every replaced occurrence, in source order of its pass
    pub spans: Vec<RecognitionSpan>,
}

/// Cumulative recognition statistics for one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionStats {
    /// Distinct surface forms replaced
    pub total_replacements: usize,
    /// Distinct surface forms replaced by pattern
    pub pattern_replacements: usize,
    /// Distinct surface forms replaced by the entity model
    pub statistical_replacements: usize,
    /// Replaced occurrences (a surface seen K times counts K)
    pub occurrences: usize,
    /// Distinct surface forms per category
    pub by_category: BTreeMap<EntityCategory, usize>,
    /// Distinct surface forms per detection method
    pub by_method: BTreeMap<DetectionMethod, usize>,
    /// Number of chunks sent to the rewriter
    pub chunk_count: usize,
}

/// Status of one pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    Skipped,
    Degraded,
    Failed,
}

/// Pipeline stage identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PatternRecognition,
    EntityRecognition,
    Chunking,
    Rewriting,
    Aggregation,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PatternRecognition => "pattern_recognition",
            Self::EntityRecognition => "entity_recognition",
            Self::Chunking => "chunking",
            Self::Rewriting => "rewriting",
            Self::Aggregation => "aggregation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-stage entry in a pipeline result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StageReport {
    pub fn new(stage: Stage, status: StageStatus) -> Self {
        Self {
            stage,
            status,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Structured failure reported in a pipeline result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub kind: FailureKind,
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendKind>,
    pub message: String,
}

impl FailureDetail {
    pub fn from_pipeline_error(stage: Stage, error: &PipelineError) -> Self {
        Self {
            kind: error.failure_kind(),
            stage,
            backend: error.backend(),
            message: error.to_string(),
        }
    }
}

/// Which recognition path fed the rewriter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineUsed {
    #[serde(rename = "NER + LLM")]
    NerAndLlm,
    #[serde(rename = "LLM Only")]
    LlmOnly,
}

impl PipelineUsed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NerAndLlm => "NER + LLM",
            Self::LlmOnly => "LLM Only",
        }
    }
}

impl fmt::Display for PipelineUsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one document-processing invocation
///
/// Constructed once at the end of `DeidPipeline::process`; failures are
/// carried in `error` with `success = false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    /// Final de-identified text (absent on failure)
    pub cleaned_text: Option<String>,
    /// Placeholder-bearing text handed to the rewriter when entity recognition ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preprocessed_text: Option<String>,
    pub original_length: usize,
    pub cleaned_length: usize,
    pub stats: RecognitionStats,
    pub stages: Vec<StageReport>,
    pub pipeline_used: PipelineUsed,
    pub degraded: bool,
    pub provider: BackendKind,
    pub model: String,
    pub processing_time_ms: u64,
    pub error: Option<FailureDetail>,
}

impl PipelineResult {
    /// Status of a given stage, if it was reported
    pub fn stage_status(&self, stage: Stage) -> Option<StageStatus> {
        self.stages
            .iter()
            .find(|report| report.stage == stage)
            .map(|report| report.status)
    }
}
