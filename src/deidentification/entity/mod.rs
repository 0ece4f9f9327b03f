//! Statistical entity recognition
//!
//! Names, organisations and places are found by an [`EntityTagger`] over the
//! pattern-cleaned text. Each distinct surface form gets one placeholder and
//! every whole-word occurrence of it is replaced.

pub mod lexicon;

pub use lexicon::LexiconTagger;

use super::models::{DetectionMethod, EntityCategory, RecognitionOutcome, RecognitionSpan};
use super::registry::PlaceholderRegistry;
use super::rewrite::{apply_spans, find_whole_word, overlaps_any, placeholder_ranges, resolve_overlaps};
use crate::config::RecognitionConfig;
use crate::domain::RecognitionError;
use std::collections::HashSet;
use std::sync::Arc;

/// A span proposed by a tagger
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedSpan {
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    /// One of `Person`, `Organization` or `Location`
    pub category: EntityCategory,
    /// Model score; higher is more confident
    pub score: f32,
}

/// Trait for statistical entity taggers
pub trait EntityTagger: Send + Sync {
    /// Model identifier for logs and diagnostics
    fn name(&self) -> &str;

    /// Tag entity spans in `text`
    fn tag(&self, text: &str) -> Vec<TaggedSpan>;
}

/// Entity recognizer
///
/// Holds the tagger, or the error raised while loading it. Construction never
/// fails so the pipeline can still run in degraded mode.
pub struct EntityRecognizer {
    tagger: Result<Arc<dyn EntityTagger>, RecognitionError>,
    min_location_chars: usize,
    location_stoplist: HashSet<String>,
}

impl EntityRecognizer {
    /// Load the configured entity model (embedded model when none is set)
    pub fn from_config(config: &RecognitionConfig) -> Self {
        let tagger = match config.entity_model {
            Some(ref path) => LexiconTagger::from_file(path),
            None => LexiconTagger::default_model(),
        };

        match tagger {
            Ok(tagger) => Self::with_tagger(Arc::new(tagger), config),
            Err(e) => {
                tracing::warn!(error = %e, "Entity model could not be loaded");
                Self::unavailable(e, config)
            }
        }
    }

    /// Use a specific tagger
    pub fn with_tagger(tagger: Arc<dyn EntityTagger>, config: &RecognitionConfig) -> Self {
        Self {
            tagger: Ok(tagger),
            min_location_chars: config.min_location_chars,
            location_stoplist: stoplist(config),
        }
    }

    /// A recognizer whose every invocation reports `error`
    pub fn unavailable(error: RecognitionError, config: &RecognitionConfig) -> Self {
        Self {
            tagger: Err(error),
            min_location_chars: config.min_location_chars,
            location_stoplist: stoplist(config),
        }
    }

    pub fn is_available(&self) -> bool {
        self.tagger.is_ok()
    }

    /// Name of the loaded model
    pub fn model_name(&self) -> Option<&str> {
        self.tagger.as_ref().ok().map(|t| t.name())
    }

    /// Replace named entities in `text` with placeholders
    ///
    /// # Errors
    ///
    /// Returns the model load error if the tagger is unavailable.
    pub fn recognize(
        &self,
        text: &str,
        registry: &mut PlaceholderRegistry,
    ) -> Result<RecognitionOutcome, RecognitionError> {
        let tagger = self.tagger.as_ref().map_err(Clone::clone)?;
        let protected = placeholder_ranges(text);

        let mut tagged = tagger.tag(text);
        tagged.sort_by_key(|s| s.start);

        // Distinct surface forms in first-seen order
        let mut seen = HashSet::new();
        let mut surfaces: Vec<(String, EntityCategory)> = Vec::new();
        for span in tagged {
            if !span.category.is_statistical() || span.end > text.len() || span.start >= span.end {
                continue;
            }
            let Some(raw) = text.get(span.start..span.end) else {
                continue;
            };
            let surface = raw.trim();
            if surface.is_empty() {
                continue;
            }
            let lead = raw.len() - raw.trim_start().len();
            let start = span.start + lead;
            if overlaps_any(&protected, start, start + surface.len()) {
                continue;
            }
            if span.category == EntityCategory::Location && !self.keep_location(surface) {
                tracing::debug!("Skipped generic or short location");
                continue;
            }
            if seen.insert(surface.to_string()) {
                surfaces.push((surface.to_string(), span.category));
            }
        }

        let spans: Vec<RecognitionSpan> = surfaces
            .iter()
            .flat_map(|(surface, category)| {
                find_whole_word(text, surface)
                    .into_iter()
                    .filter(|r| !overlaps_any(&protected, r.start, r.end))
                    .map(|r| {
                        RecognitionSpan::new(
                            r.start,
                            r.end,
                            surface.clone(),
                            *category,
                            DetectionMethod::Statistical,
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        let spans = resolve_overlaps(spans);
        let rewritten = apply_spans(text, &spans, registry);

        Ok(RecognitionOutcome {
            text: rewritten,
            spans,
        })
    }

    fn keep_location(&self, surface: &str) -> bool {
        surface.chars().count() >= self.min_location_chars
            && !self.location_stoplist.contains(&surface.to_lowercase())
    }
}

fn stoplist(config: &RecognitionConfig) -> HashSet<String> {
    config
        .location_stoplist
        .iter()
        .map(|s| s.to_lowercase())
        .collect()
}
