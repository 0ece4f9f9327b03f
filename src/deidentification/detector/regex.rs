//! Regex-based recognizer for structured identifiers

use super::patterns::{PatternLibrary, PATTERN_PASSES};
use crate::config::RecognitionConfig;
use crate::deidentification::models::{
    DetectionMethod, EntityCategory, RecognitionOutcome, RecognitionSpan,
};
use crate::deidentification::registry::PlaceholderRegistry;
use crate::deidentification::rewrite::{
    apply_spans, find_whole_word, overlaps_any, placeholder_ranges, resolve_overlaps,
};
use crate::domain::RecognitionError;
use std::collections::HashSet;
use std::sync::Arc;

/// Pattern recognizer
///
/// Runs one pass per category group over the progressively rewritten text.
/// Absence of matches is a normal outcome; recognition itself never fails.
#[derive(Debug, Clone)]
pub struct PatternRecognizer {
    library: Arc<PatternLibrary>,
}

impl PatternRecognizer {
    /// Create a recognizer over the embedded pattern library
    pub fn new() -> Result<Self, RecognitionError> {
        Ok(Self::with_library(PatternLibrary::default_library()?))
    }

    /// Create a recognizer over a custom pattern library
    pub fn with_library(library: PatternLibrary) -> Self {
        Self {
            library: Arc::new(library),
        }
    }

    /// Create a recognizer from configuration
    pub fn from_config(config: &RecognitionConfig) -> Result<Self, RecognitionError> {
        match config.pattern_library {
            Some(ref path) => Ok(Self::with_library(PatternLibrary::from_file(path)?)),
            None => Self::new(),
        }
    }

    /// Replace every structured identifier in `text` with its placeholder
    pub fn recognize(&self, text: &str, registry: &mut PlaceholderRegistry) -> RecognitionOutcome {
        let mut current = text.to_string();
        let mut replaced = Vec::new();

        for categories in PATTERN_PASSES {
            let spans = self.detect_pass(&current, categories);
            if spans.is_empty() {
                continue;
            }
            current = apply_spans(&current, &spans, registry);
            replaced.extend(spans);
        }

        RecognitionOutcome {
            text: current,
            spans: replaced,
        }
    }

    /// Spans for one pass, computed before any mutation of `text`
    fn detect_pass(&self, text: &str, categories: &[EntityCategory]) -> Vec<RecognitionSpan> {
        let protected = placeholder_ranges(text);
        let mut spans = Vec::new();

        for pattern in self.library.patterns_for(categories) {
            for found in pattern.regex.find_iter(text) {
                let m = match found {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::warn!(pattern = %pattern.name, error = %e, "Pattern evaluation aborted");
                        break;
                    }
                };
                if m.start() == m.end() || overlaps_any(&protected, m.start(), m.end()) {
                    continue;
                }
                spans.push(RecognitionSpan::new(
                    m.start(),
                    m.end(),
                    m.as_str(),
                    pattern.category,
                    DetectionMethod::Pattern,
                ));
            }
        }

        // Every literal occurrence of a matched value is replaced, even where
        // the pattern itself would not match in that context.
        let mut seen = HashSet::new();
        let literal: Vec<RecognitionSpan> = spans
            .iter()
            .filter(|span| seen.insert(span.surface.clone()))
            .flat_map(|span| {
                find_whole_word(text, &span.surface)
                    .into_iter()
                    .filter(|r| !overlaps_any(&protected, r.start, r.end))
                    .map(|r| {
                        RecognitionSpan::new(
                            r.start,
                            r.end,
                            span.surface.clone(),
                            span.category,
                            DetectionMethod::Pattern,
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        spans.extend(literal);
        resolve_overlaps(spans)
    }
}
