//! Structured identifier detection
//!
//! Regex patterns grouped by category, applied as ordered passes over the
//! progressively rewritten text.

pub mod patterns;
pub mod regex;

pub use patterns::{CompiledPattern, PatternLibrary, PATTERN_PASSES};
pub use regex::PatternRecognizer;
