//! Per-document placeholder registry
//!
//! One registry is created for each document-processing call and dropped
//! when it returns. It is never shared between documents.

use super::models::{DetectionMethod, EntityCategory, RecognitionStats};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A typed stand-in token such as `[ЛИЦО-2]` or `[ТЕЛЕФОН]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placeholder {
    pub category: EntityCategory,
    /// Per-category sequence number; `None` for flat categories
    pub index: Option<u32>,
}

impl Placeholder {
    pub fn numbered(category: EntityCategory, index: u32) -> Self {
        Self {
            category,
            index: Some(index),
        }
    }

    pub fn flat(category: EntityCategory) -> Self {
        Self {
            category,
            index: None,
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(n) => write!(f, "[{}-{}]", self.category.tag(), n),
            None => write!(f, "[{}]", self.category.tag()),
        }
    }
}

/// One registered surface form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub surface: String,
    pub placeholder: Placeholder,
    pub method: DetectionMethod,
}

/// Mapping from original surface forms to placeholders
///
/// Counters are scoped per category and start at 1. A surface form keeps the
/// placeholder it was first given for the rest of the document.
#[derive(Debug, Default)]
pub struct PlaceholderRegistry {
    counters: HashMap<EntityCategory, u32>,
    by_surface: HashMap<String, usize>,
    entries: Vec<RegistryEntry>,
}

impl PlaceholderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next sequence number for `category`
    pub fn next(&mut self, category: EntityCategory) -> u32 {
        let counter = self.counters.entry(category).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Placeholder for `surface`, minting a new one on first sight
    ///
    /// Flat categories never consume a counter value.
    pub fn get_or_create(
        &mut self,
        surface: &str,
        category: EntityCategory,
        method: DetectionMethod,
    ) -> Placeholder {
        if let Some(&idx) = self.by_surface.get(surface) {
            return self.entries[idx].placeholder;
        }

        let placeholder = if category.is_numbered() {
            Placeholder::numbered(category, self.next(category))
        } else {
            Placeholder::flat(category)
        };

        tracing::debug!(placeholder = %placeholder, method = ?method, "Registered placeholder");

        self.by_surface
            .insert(surface.to_string(), self.entries.len());
        self.entries.push(RegistryEntry {
            surface: surface.to_string(),
            placeholder,
            method,
        });
        placeholder
    }

    /// Existing placeholder for `surface`
    pub fn lookup(&self, surface: &str) -> Option<Placeholder> {
        self.by_surface
            .get(surface)
            .map(|&idx| self.entries[idx].placeholder)
    }

    /// Registered entries in first-seen order
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct-surface statistics; occurrence and chunk counts are left at zero
    pub fn stats(&self) -> RecognitionStats {
        let mut stats = RecognitionStats {
            total_replacements: self.entries.len(),
            ..Default::default()
        };

        for entry in &self.entries {
            *stats.by_category.entry(entry.placeholder.category).or_insert(0) += 1;
            *stats.by_method.entry(entry.method).or_insert(0) += 1;
            match entry.method {
                DetectionMethod::Pattern => stats.pattern_replacements += 1,
                DetectionMethod::Statistical => stats.statistical_replacements += 1,
            }
        }

        stats
    }
}
