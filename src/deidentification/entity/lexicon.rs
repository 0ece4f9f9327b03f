//! Feature-weighted lexicon tagger for Russian and Kazakh names, organisations and places

use super::{EntityTagger, TaggedSpan};
use crate::deidentification::models::EntityCategory;
use crate::deidentification::rewrite::{overlaps_any, placeholder_ranges};
use crate::domain::RecognitionError;
use serde::Deserialize;
use std::collections::HashSet;
use std::ops::Range;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ModelFile {
    name: String,
    #[serde(default)]
    version: Option<String>,
    threshold: f32,
    person: PersonFeatures,
    organization: OrganizationFeatures,
    location: LocationFeatures,
}

#[derive(Debug, Deserialize)]
struct PersonFeatures {
    max_tokens: usize,
    single_token_penalty: f32,
    patronymic_weight: f32,
    patronymic_suffixes: Vec<String>,
    surname_weight: f32,
    surname_suffixes: Vec<String>,
    given_name_weight: f32,
    given_names: Vec<String>,
    initial_weight: f32,
}

#[derive(Debug, Deserialize)]
struct OrganizationFeatures {
    marker_weight: f32,
    markers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LocationFeatures {
    marker_weight: f32,
    gazetteer_weight: f32,
    markers_before: Vec<String>,
    markers_after: Vec<String>,
    /// After-markers that follow a name in its base form (Kazakh)
    #[serde(default)]
    nominal_markers_after: Vec<String>,
    #[serde(default)]
    adjectival_suffixes: Vec<String>,
    gazetteer: Vec<String>,
    /// Role and institution nouns never tagged as places
    #[serde(default)]
    stoplist: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// Uppercase first letter, not all caps
    Capitalized,
    /// Single uppercase letter followed by a dot
    Initial,
    /// Two or more letters, all uppercase
    Acronym,
    Lower,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    start: usize,
    end: usize,
    text: &'a str,
    shape: Shape,
    dot_after: bool,
}

impl Token<'_> {
    fn is_name_like(&self) -> bool {
        matches!(self.shape, Shape::Capitalized | Shape::Initial)
    }

    /// Lowercased form including a trailing dot, for marker lookup
    fn marker_form(&self) -> String {
        let lower = self.text.to_lowercase();
        if self.dot_after && self.shape != Shape::Initial {
            format!("{lower}.")
        } else {
            lower
        }
    }
}

/// Lexicon-based entity tagger
///
/// Candidates are runs of capitalised tokens. Person runs are scored on
/// patronymic and surname suffixes, known given names and initials. Places
/// come from the gazetteer or from adjacent markers. Organisations are a
/// legal-form marker followed by a quoted name.
#[derive(Debug, Clone)]
pub struct LexiconTagger {
    name: String,
    version: Option<String>,
    threshold: f32,
    max_person_tokens: usize,
    single_token_penalty: f32,
    patronymic_weight: f32,
    patronymic_suffixes: Vec<String>,
    surname_weight: f32,
    surname_suffixes: Vec<String>,
    given_name_weight: f32,
    given_names: HashSet<String>,
    initial_weight: f32,
    org_weight: f32,
    org_markers: HashSet<String>,
    location_marker_weight: f32,
    gazetteer_weight: f32,
    markers_before: HashSet<String>,
    markers_after: HashSet<String>,
    nominal_markers_after: HashSet<String>,
    adjectival_suffixes: Vec<String>,
    gazetteer: HashSet<String>,
    location_stoplist: HashSet<String>,
}

impl LexiconTagger {
    /// Load a model from a TOML file
    ///
    /// An unreadable file is reported as an unavailable model; a readable
    /// but malformed one as an invalid model.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RecognitionError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| RecognitionError::ModelUnavailable {
                model: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Self::from_toml(&content).map_err(|e| match e {
            RecognitionError::InvalidModel { reason, .. } => RecognitionError::InvalidModel {
                model: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Build a model from TOML content
    pub fn from_toml(content: &str) -> Result<Self, RecognitionError> {
        let file: ModelFile =
            toml::from_str(content).map_err(|e| RecognitionError::InvalidModel {
                model: "entity_model".to_string(),
                reason: e.to_string(),
            })?;

        if file.threshold <= 0.0 {
            return Err(RecognitionError::InvalidModel {
                model: file.name,
                reason: "threshold must be > 0".to_string(),
            });
        }
        if file.person.max_tokens == 0 {
            return Err(RecognitionError::InvalidModel {
                model: file.name,
                reason: "person.max_tokens must be > 0".to_string(),
            });
        }

        let lower_set = |items: &[String]| -> HashSet<String> {
            items.iter().map(|s| s.to_lowercase()).collect()
        };
        let by_length = |mut items: Vec<String>| {
            items.iter_mut().for_each(|s| *s = s.to_lowercase());
            // Longest suffix first so "ович" is tried before "ич"
            items.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
            items
        };

        Ok(Self {
            threshold: file.threshold,
            max_person_tokens: file.person.max_tokens,
            single_token_penalty: file.person.single_token_penalty,
            patronymic_weight: file.person.patronymic_weight,
            patronymic_suffixes: by_length(file.person.patronymic_suffixes),
            surname_weight: file.person.surname_weight,
            surname_suffixes: by_length(file.person.surname_suffixes),
            given_name_weight: file.person.given_name_weight,
            given_names: lower_set(&file.person.given_names),
            initial_weight: file.person.initial_weight,
            org_weight: file.organization.marker_weight,
            org_markers: file.organization.markers.into_iter().collect(),
            location_marker_weight: file.location.marker_weight,
            gazetteer_weight: file.location.gazetteer_weight,
            markers_before: lower_set(&file.location.markers_before),
            markers_after: lower_set(&file.location.markers_after),
            nominal_markers_after: lower_set(&file.location.nominal_markers_after),
            adjectival_suffixes: by_length(file.location.adjectival_suffixes),
            gazetteer: lower_set(&file.location.gazetteer),
            location_stoplist: lower_set(&file.location.stoplist),
            name: file.name,
            version: file.version,
        })
    }

    /// Model embedded in the binary
    pub fn default_model() -> Result<Self, RecognitionError> {
        Self::from_toml(include_str!("../../../models/ru_kk_entities.toml"))
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Person feature score for one token and whether it was a patronymic
    fn person_feature(&self, token: &Token<'_>) -> (f32, bool) {
        match token.shape {
            Shape::Initial => (self.initial_weight, false),
            Shape::Capitalized => {
                let lower = token.text.to_lowercase();
                let len = lower.chars().count();
                let has_suffix = |suffixes: &[String]| {
                    suffixes
                        .iter()
                        .any(|s| len > s.chars().count() + 1 && lower.ends_with(s.as_str()))
                };

                let mut score = 0.0;
                let mut patronymic = false;
                if has_suffix(&self.patronymic_suffixes) {
                    score += self.patronymic_weight;
                    patronymic = true;
                } else if has_suffix(&self.surname_suffixes) {
                    score += self.surname_weight;
                }
                if self.given_names.contains(&lower) {
                    score += self.given_name_weight;
                }
                (score, patronymic)
            }
            _ => (0.0, false),
        }
    }

    fn organization_spans(&self, text: &str, tokens: &[Token<'_>]) -> Vec<TaggedSpan> {
        tokens
            .iter()
            .filter(|t| self.org_markers.contains(t.text))
            .filter_map(|marker| {
                let rest = &text[marker.end..];
                let offset = rest.len() - rest.trim_start_matches([' ', '\u{a0}']).len();
                let open_at = marker.end + offset;
                let open = text[open_at..].chars().next()?;
                let close = match open {
                    '«' => '»',
                    '"' => '"',
                    '“' => '”',
                    '„' => '“',
                    _ => return None,
                };
                let body_start = open_at + open.len_utf8();
                let body = &text[body_start..];
                let close_rel = body.find(close)?;
                let name = &body[..close_rel];
                if name.trim().is_empty() || name.contains('\n') || name.chars().count() > 150 {
                    return None;
                }
                Some(TaggedSpan {
                    start: marker.start,
                    end: body_start + close_rel + close.len_utf8(),
                    category: EntityCategory::Organization,
                    score: self.org_weight,
                })
            })
            .collect()
    }

    fn person_candidate(&self, run: &[Token<'_>]) -> Option<TaggedSpan> {
        let features: Vec<(f32, bool)> = run.iter().map(|t| self.person_feature(t)).collect();
        let first = features.iter().position(|(s, _)| *s > 0.0)?;
        let last = features.iter().rposition(|(s, _)| *s > 0.0)?;
        let core = &run[first..=last];
        let core_features = &features[first..=last];

        if core.len() > self.max_person_tokens
            || core.iter().all(|t| t.shape == Shape::Initial)
        {
            return None;
        }

        let mut score: f32 = core_features.iter().map(|(s, _)| s).sum();
        let has_patronymic = core_features.iter().any(|(_, p)| *p);
        if core.len() == 1 && !has_patronymic {
            score += self.single_token_penalty;
        }

        Some(TaggedSpan {
            start: core[0].start,
            end: core[core.len() - 1].end,
            category: EntityCategory::Person,
            score,
        })
    }

    fn location_candidates(
        &self,
        text: &str,
        tokens: &[Token<'_>],
        run: Range<usize>,
    ) -> Vec<TaggedSpan> {
        let before_marker = run
            .start
            .checked_sub(1)
            .map(|i| &tokens[i])
            .filter(|prev| marker_adjacent(text, prev, &tokens[run.start]))
            // "2024 г." is a year, not a town
            .filter(|prev| !(prev.dot_after && follows_number(text, prev)))
            .is_some_and(|prev| {
                self.markers_before.contains(&prev.marker_form())
                    || self.markers_before.contains(&prev.text.to_lowercase())
            });
        let after_marker = tokens
            .get(run.end)
            .filter(|next| gap_is_space(&text[tokens[run.end - 1].end..next.start]))
            .filter(|next| next.shape == Shape::Lower)
            .map(|next| next.text.to_lowercase())
            .filter(|marker| self.markers_after.contains(marker))
            .map(|marker| self.nominal_markers_after.contains(&marker));

        let mut candidates = Vec::new();
        for idx in run.clone() {
            let token = &tokens[idx];
            if token.shape != Shape::Capitalized {
                continue;
            }
            let lower = token.text.to_lowercase();
            if self.location_stoplist.contains(&lower) {
                continue;
            }
            let mut score = 0.0;
            if self.gazetteer.contains(&lower) {
                score += self.gazetteer_weight;
            }
            if idx == run.start && before_marker {
                score += self.location_marker_weight;
            }
            // Russian markers need the adjectival place form: "Карагандинской области"
            // but not "Прокуратура района"
            let adjectival = || {
                let len = lower.chars().count();
                self.adjectival_suffixes
                    .iter()
                    .any(|s| len > s.chars().count() + 1 && lower.ends_with(s.as_str()))
            };
            if idx == run.end - 1 && after_marker.is_some_and(|nominal| nominal || adjectival()) {
                score += self.location_marker_weight;
            }
            if score > 0.0 {
                candidates.push(TaggedSpan {
                    start: token.start,
                    end: token.end,
                    category: EntityCategory::Location,
                    score,
                });
            }
        }
        candidates
    }
}

impl EntityTagger for LexiconTagger {
    fn name(&self) -> &str {
        &self.name
    }

    fn tag(&self, text: &str) -> Vec<TaggedSpan> {
        let protected = placeholder_ranges(text);
        let tokens = tokenize(text, &protected);

        let organizations = self.organization_spans(text, &tokens);

        let mut candidates = Vec::new();
        for run in name_runs(text, &tokens) {
            if let Some(person) = self.person_candidate(&tokens[run.clone()]) {
                candidates.push(person);
            }
            candidates.extend(self.location_candidates(text, &tokens, run));
        }

        candidates.retain(|c| {
            c.score >= self.threshold
                && !organizations
                    .iter()
                    .any(|o| c.start < o.end && o.start < c.end)
        });
        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.start.cmp(&b.start))
        });

        let mut kept: Vec<TaggedSpan> = organizations
            .into_iter()
            .filter(|o| o.score >= self.threshold)
            .collect();
        for candidate in candidates {
            if !kept
                .iter()
                .any(|k| candidate.start < k.end && k.start < candidate.end)
            {
                kept.push(candidate);
            }
        }

        kept.sort_by_key(|s| s.start);
        kept
    }
}

fn tokenize<'a>(text: &'a str, protected: &[Range<usize>]) -> Vec<Token<'a>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if !c.is_alphabetic() {
            continue;
        }

        let mut end = start + c.len_utf8();
        while let Some(&(i, ch)) = chars.peek() {
            if ch.is_alphabetic() {
                end = i + ch.len_utf8();
                chars.next();
            } else if ch == '-'
                && text[i + 1..].chars().next().is_some_and(char::is_alphabetic)
            {
                end = i + 1;
                chars.next();
            } else {
                break;
            }
        }

        if overlaps_any(protected, start, end) {
            continue;
        }

        let word = &text[start..end];
        let dot_after = text[end..].starts_with('.');
        let letters = word.chars().filter(|ch| ch.is_alphabetic()).count();
        let first_upper = c.is_uppercase();

        let (shape, token_end) = if first_upper && letters == 1 && dot_after {
            (Shape::Initial, end + 1)
        } else if first_upper && letters >= 2 && word.chars().all(|ch| !ch.is_lowercase()) {
            (Shape::Acronym, end)
        } else if first_upper {
            (Shape::Capitalized, end)
        } else {
            (Shape::Lower, end)
        };

        if shape == Shape::Initial {
            // consume the dot so it is not seen as a separator
            chars.next();
        }

        tokens.push(Token {
            start,
            end: token_end,
            text: word,
            shape,
            dot_after,
        });
    }

    tokens
}

fn gap_is_space(gap: &str) -> bool {
    !gap.is_empty() && gap.chars().all(|c| c == ' ' || c == '\t' || c == '\u{a0}')
}

/// Whether `marker` directly precedes `next`, allowing the marker's own dot
fn marker_adjacent(text: &str, marker: &Token<'_>, next: &Token<'_>) -> bool {
    let gap = &text[marker.end..next.start];
    let gap = if marker.dot_after && marker.shape != Shape::Initial {
        gap.strip_prefix('.').unwrap_or(gap)
    } else {
        gap
    };
    gap.is_empty() || gap_is_space(gap)
}

/// Whether the nearest non-space text before `token` is a digit
fn follows_number(text: &str, token: &Token<'_>) -> bool {
    text[..token.start]
        .trim_end_matches([' ', '\t', '\u{a0}'])
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_digit())
}

/// Maximal runs of name-like tokens separated only by spaces
fn name_runs(text: &str, tokens: &[Token<'_>]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut idx = 0;

    while idx < tokens.len() {
        if !tokens[idx].is_name_like() {
            idx += 1;
            continue;
        }
        let start = idx;
        while idx + 1 < tokens.len() && tokens[idx + 1].is_name_like() {
            let prev = &tokens[idx];
            let next = &tokens[idx + 1];
            let gap = &text[prev.end..next.start];
            let joined = gap_is_space(gap) || (gap.is_empty() && prev.shape == Shape::Initial);
            if !joined {
                break;
            }
            idx += 1;
        }
        runs.push(start..idx + 1);
        idx += 1;
    }

    runs
}
