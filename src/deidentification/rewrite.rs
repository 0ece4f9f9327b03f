//! Span-based text rewriting shared by both recognizers
//!
//! Spans are computed against the unmodified text, overlaps are resolved,
//! placeholders are minted in source order and the edits are applied right to
//! left so earlier offsets stay valid.

use super::models::{EntityCategory, RecognitionSpan};
use super::registry::PlaceholderRegistry;
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

const ALL_CATEGORIES: [EntityCategory; 13] = [
    EntityCategory::Phone,
    EntityCategory::Email,
    EntityCategory::TaxId,
    EntityCategory::BusinessId,
    EntityCategory::SocialId,
    EntityCategory::Passport,
    EntityCategory::LicensePlate,
    EntityCategory::BankAccount,
    EntityCategory::CardNumber,
    EntityCategory::Address,
    EntityCategory::Person,
    EntityCategory::Organization,
    EntityCategory::Location,
];

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        let tags: Vec<&str> = ALL_CATEGORIES.iter().map(|c| c.tag()).collect();
        let pattern = format!(r"\[(?:{})(?:-\d+)?\]", tags.join("|"));
        Regex::new(&pattern).expect("placeholder pattern is a valid constant regex")
    })
}

/// Byte ranges of placeholders already present in `text`
pub fn placeholder_ranges(text: &str) -> Vec<Range<usize>> {
    placeholder_regex()
        .find_iter(text)
        .map(|m| m.range())
        .collect()
}

/// Whether `start..end` touches any of the given ranges
pub fn overlaps_any(ranges: &[Range<usize>], start: usize, end: usize) -> bool {
    ranges.iter().any(|r| start < r.end && r.start < end)
}

/// Whole-word occurrences of `needle` in `text`
///
/// Boundaries are only enforced on sides where the needle itself starts or
/// ends with an alphanumeric character.
pub fn find_whole_word(text: &str, needle: &str) -> Vec<Range<usize>> {
    if needle.is_empty() {
        return Vec::new();
    }

    let first_is_word = needle.chars().next().is_some_and(char::is_alphanumeric);
    let last_is_word = needle.chars().next_back().is_some_and(char::is_alphanumeric);

    text.match_indices(needle)
        .filter(|(start, _)| {
            let end = start + needle.len();
            let before_ok = !first_is_word
                || !text[..*start]
                    .chars()
                    .next_back()
                    .is_some_and(char::is_alphanumeric);
            let after_ok = !last_is_word
                || !text[end..].chars().next().is_some_and(char::is_alphanumeric);
            before_ok && after_ok
        })
        .map(|(start, _)| start..start + needle.len())
        .collect()
}

/// Keep a non-overlapping subset: earliest start wins, then the longest span
pub fn resolve_overlaps(mut spans: Vec<RecognitionSpan>) -> Vec<RecognitionSpan> {
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.len().cmp(&a.len())));

    let mut kept: Vec<RecognitionSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if span.is_empty() {
            continue;
        }
        match kept.last() {
            Some(last) if span.start < last.end => continue,
            _ => kept.push(span),
        }
    }
    kept
}

/// Replace `spans` in `text` with registry placeholders
///
/// `spans` must be sorted and non-overlapping (see [`resolve_overlaps`]).
pub fn apply_spans(
    text: &str,
    spans: &[RecognitionSpan],
    registry: &mut PlaceholderRegistry,
) -> String {
    let placeholders: Vec<String> = spans
        .iter()
        .map(|span| {
            registry
                .get_or_create(&span.surface, span.category, span.method)
                .to_string()
        })
        .collect();

    let mut output = text.to_string();
    for (span, placeholder) in spans.iter().zip(placeholders.iter()).rev() {
        output.replace_range(span.start..span.end, placeholder);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deidentification::models::DetectionMethod;

    fn span(start: usize, end: usize, text: &str, category: EntityCategory) -> RecognitionSpan {
        RecognitionSpan::new(
            start,
            end,
            &text[start..end],
            category,
            DetectionMethod::Pattern,
        )
    }

    #[test]
    fn test_placeholder_ranges() {
        let text = "Истец [ЛИЦО-1], тел. [ТЕЛЕФОН], ссылка [1]";
        let ranges = placeholder_ranges(text);
        assert_eq!(ranges.len(), 2);
        assert_eq!(&text[ranges[0].clone()], "[ЛИЦО-1]");
        assert_eq!(&text[ranges[1].clone()], "[ТЕЛЕФОН]");
    }

    #[test]
    fn test_find_whole_word_respects_boundaries() {
        let text = "Иван и Иванов, Иван.";
        let found = find_whole_word(text, "Иван");
        assert_eq!(found.len(), 2);
        for r in found {
            assert_eq!(&text[r], "Иван");
        }
    }

    #[test]
    fn test_find_whole_word_digits() {
        let text = "1234567890 и 12345678901";
        assert_eq!(find_whole_word(text, "1234567890").len(), 1);
    }

    #[test]
    fn test_resolve_overlaps_prefers_earliest_then_longest() {
        let text = "БИН 123456789012";
        let labelled = span(0, text.len(), text, EntityCategory::BusinessId);
        let bare = span(7, text.len(), text, EntityCategory::TaxId);
        let kept = resolve_overlaps(vec![bare, labelled.clone()]);
        assert_eq!(kept, vec![labelled]);
    }

    #[test]
    fn test_apply_spans_right_to_left() {
        let text = "a@b.kz и c@d.kz";
        let first = span(0, 6, text, EntityCategory::Email);
        let second_start = text.find("c@d").unwrap();
        let second = span(second_start, text.len(), text, EntityCategory::Email);
        let mut registry = PlaceholderRegistry::new();

        let out = apply_spans(text, &[first, second], &mut registry);
        assert_eq!(out, "[EMAIL] и [EMAIL]");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_substring_surfaces_do_not_collide() {
        // "Ким" is a substring of "Кимов"; span rewriting keeps them apart
        let text = "Кимов и Ким";
        let long = RecognitionSpan::new(
            0,
            "Кимов".len(),
            "Кимов",
            EntityCategory::Person,
            DetectionMethod::Statistical,
        );
        let short_start = text.rfind("Ким").unwrap();
        let short = RecognitionSpan::new(
            short_start,
            text.len(),
            "Ким",
            EntityCategory::Person,
            DetectionMethod::Statistical,
        );
        let mut registry = PlaceholderRegistry::new();
        let out = apply_spans(text, &resolve_overlaps(vec![short, long]), &mut registry);
        assert_eq!(out, "[ЛИЦО-1] и [ЛИЦО-2]");
    }
}
