//! Pattern library for structured identifiers

use crate::deidentification::models::EntityCategory;
use crate::domain::RecognitionError;
use fancy_regex::Regex;
use serde::Deserialize;
use std::path::Path;

/// Pattern passes in the order they are applied
///
/// Tax and business IDs share a pass so overlap resolution can prefer the
/// labelled business-ID form over the bare-number tax-ID form.
pub const PATTERN_PASSES: [&[EntityCategory]; 9] = [
    &[EntityCategory::Phone],
    &[EntityCategory::Email],
    &[EntityCategory::TaxId, EntityCategory::BusinessId],
    &[EntityCategory::SocialId],
    &[EntityCategory::Passport],
    &[EntityCategory::LicensePlate],
    &[EntityCategory::BankAccount],
    &[EntityCategory::CardNumber],
    &[EntityCategory::Address],
];

/// Pattern definition from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct PatternDefinition {
    /// Identifier used in error messages
    pub name: String,
    /// Category label (PHONE, TAX_ID, ADDRESS ...)
    pub category: String,
    /// Regex patterns for this category
    pub patterns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LibraryFile {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    category: Vec<PatternDefinition>,
}

/// Compiled pattern with metadata
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub name: String,
    pub category: EntityCategory,
    pub regex: Regex,
}

/// Compiled, category-indexed pattern library
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    version: Option<String>,
    patterns: Vec<CompiledPattern>,
}

impl PatternLibrary {
    /// Load a library from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RecognitionError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| RecognitionError::InvalidPattern {
                name: path.display().to_string(),
                reason: format!("failed to read pattern library: {e}"),
            })?;
        Self::from_toml(&content)
    }

    /// Compile a library from TOML content
    pub fn from_toml(content: &str) -> Result<Self, RecognitionError> {
        let file: LibraryFile =
            toml::from_str(content).map_err(|e| RecognitionError::InvalidPattern {
                name: "pattern_library".to_string(),
                reason: format!("failed to parse TOML: {e}"),
            })?;

        let mut patterns = Vec::new();
        for def in file.category {
            let category = EntityCategory::from_label(&def.category)
                .filter(|c| !c.is_statistical())
                .ok_or_else(|| RecognitionError::InvalidPattern {
                    name: def.name.clone(),
                    reason: format!("unknown pattern category '{}'", def.category),
                })?;

            for source in &def.patterns {
                let regex = Regex::new(source).map_err(|e| RecognitionError::InvalidPattern {
                    name: def.name.clone(),
                    reason: format!("{e}: {source}"),
                })?;
                patterns.push(CompiledPattern {
                    name: def.name.clone(),
                    category,
                    regex,
                });
            }
        }

        Ok(Self {
            version: file.version,
            patterns,
        })
    }

    /// Library embedded in the binary
    pub fn default_library() -> Result<Self, RecognitionError> {
        Self::from_toml(include_str!("../../../patterns/pii_patterns.toml"))
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn all_patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Patterns for any of `categories`, in file order
    pub fn patterns_for<'a>(
        &'a self,
        categories: &'a [EntityCategory],
    ) -> impl Iterator<Item = &'a CompiledPattern> + 'a {
        self.patterns
            .iter()
            .filter(move |p| categories.contains(&p.category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any_match(library: &PatternLibrary, category: EntityCategory, text: &str) -> bool {
        library
            .patterns_for(&[category])
            .any(|p| p.regex.is_match(text).unwrap_or(false))
    }

    #[test]
    fn test_load_default_library() {
        let library = PatternLibrary::default_library().unwrap();
        assert!(!library.all_patterns().is_empty());
        assert_eq!(library.version(), Some("1.0"));
    }

    #[test]
    fn test_every_pass_has_patterns() {
        let library = PatternLibrary::default_library().unwrap();
        for pass in PATTERN_PASSES {
            assert!(library.patterns_for(pass).next().is_some(), "{pass:?}");
        }
    }

    #[test]
    fn test_email_pattern() {
        let library = PatternLibrary::default_library().unwrap();
        assert!(any_match(&library, EntityCategory::Email, "test@example.kz"));
        assert!(!any_match(&library, EntityCategory::Email, "not-an-email"));
    }

    #[test]
    fn test_unknown_category_rejected() {
        let toml = r#"
[[category]]
name = "names"
category = "PERSON"
patterns = ['[А-Я][а-я]+']
"#;
        let err = PatternLibrary::from_toml(toml).unwrap_err();
        assert!(matches!(err, RecognitionError::InvalidPattern { .. }));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let toml = r#"
[[category]]
name = "broken"
category = "PHONE"
patterns = ['(\d+']
"#;
        let err = PatternLibrary::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_missing_file() {
        assert!(PatternLibrary::from_file("/nonexistent/patterns.toml").is_err());
    }
}
