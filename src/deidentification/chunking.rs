//! Paragraph-aligned chunking and fail-fast aggregation
//!
//! Sizes are measured in characters, not bytes.

use crate::domain::{GenerationError, PipelineError};

/// Separator between paragraphs and between rewritten chunks
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// What to do with a single paragraph larger than the budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OversizePolicy {
    /// Emit the paragraph as its own oversized chunk
    #[default]
    KeepWhole,
    /// Split the paragraph at sentence boundaries
    SplitSentences,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split `text` into paragraph-aligned chunks of at most `max_chunk_chars`
///
/// Joining the result with [`PARAGRAPH_SEPARATOR`] reproduces `text`, minus
/// any blank paragraphs. No chunk is ever blank.
pub fn split(text: &str, max_chunk_chars: usize) -> Vec<String> {
    split_with_policy(text, max_chunk_chars, OversizePolicy::KeepWhole)
}

/// Split with an explicit policy for oversized paragraphs
pub fn split_with_policy(text: &str, max_chunk_chars: usize, policy: OversizePolicy) -> Vec<String> {
    if char_len(text) <= max_chunk_chars {
        return vec![text.to_string()];
    }

    let separator_len = char_len(PARAGRAPH_SEPARATOR);
    let mut chunks = Vec::new();
    let mut buffer: Option<String> = None;
    let mut buffer_len = 0;

    for paragraph in text.split(PARAGRAPH_SEPARATOR) {
        // Leading or repeated separators leave nothing to rewrite
        if paragraph.trim().is_empty() {
            continue;
        }
        let paragraph_len = char_len(paragraph);

        if paragraph_len > max_chunk_chars && policy == OversizePolicy::SplitSentences {
            if let Some(done) = buffer.take() {
                chunks.push(done);
            }
            chunks.extend(split_sentences(paragraph, max_chunk_chars));
            continue;
        }

        match buffer.as_mut() {
            Some(current) if buffer_len + separator_len + paragraph_len <= max_chunk_chars => {
                current.push_str(PARAGRAPH_SEPARATOR);
                current.push_str(paragraph);
                buffer_len += separator_len + paragraph_len;
            }
            _ => {
                if let Some(done) = buffer.take() {
                    chunks.push(done);
                }
                buffer = Some(paragraph.to_string());
                buffer_len = paragraph_len;
            }
        }
    }

    if let Some(done) = buffer {
        chunks.push(done);
    }

    tracing::debug!(chunks = chunks.len(), max_chunk_chars, "Text split into chunks");
    chunks
}

/// Greedy sentence packing; a single over-long sentence stays whole
fn split_sentences(paragraph: &str, max_chunk_chars: usize) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = paragraph.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?' | '…') {
            if let Some(&(next_i, next_c)) = chars.peek() {
                if next_c.is_whitespace() {
                    // keep the trailing whitespace with the sentence
                    let end = next_i + next_c.len_utf8();
                    chars.next();
                    sentences.push(&paragraph[start..end]);
                    start = end;
                }
            }
        }
    }
    if start < paragraph.len() {
        sentences.push(&paragraph[start..]);
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    for sentence in sentences {
        if !current.is_empty() && char_len(&current) + char_len(sentence) > max_chunk_chars {
            pieces.push(std::mem::take(&mut current));
        }
        current.push_str(sentence);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Result of rewriting one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOutput {
    pub original_chars: usize,
    pub cleaned_text: String,
}

/// Combined output of every chunk of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedOutput {
    pub text: String,
    pub original_chars: usize,
    pub cleaned_chars: usize,
    pub chunk_count: usize,
}

/// Concatenate chunk outputs in order, failing on the first failed chunk
///
/// `total_chunks` is the number of chunks the document was split into; it can
/// exceed `results.len()` when processing stopped at a failure. A single-chunk
/// document reports the generation error itself rather than a chunk failure.
pub fn aggregate(
    results: Vec<Result<ChunkOutput, GenerationError>>,
    total_chunks: usize,
) -> Result<AggregatedOutput, PipelineError> {
    let mut texts = Vec::with_capacity(results.len());
    let mut original_chars = 0;

    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(output) => {
                original_chars += output.original_chars;
                texts.push(output.cleaned_text);
            }
            Err(source) if total_chunks <= 1 => return Err(PipelineError::Generation(source)),
            Err(source) => {
                return Err(PipelineError::ChunkProcessingFailed {
                    chunk: index + 1,
                    total: total_chunks,
                    source,
                })
            }
        }
    }

    if texts.len() < total_chunks {
        return Err(PipelineError::Misconfigured(format!(
            "only {} of {} chunks were processed",
            texts.len(),
            total_chunks
        )));
    }

    let text = texts.join(PARAGRAPH_SEPARATOR);
    let cleaned_chars = texts.iter().map(|t| char_len(t)).sum();

    Ok(AggregatedOutput {
        text,
        original_chars,
        cleaned_chars,
        chunk_count: texts.len(),
    })
}
