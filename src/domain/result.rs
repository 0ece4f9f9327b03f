//! Result type alias for LexRedact
//!
//! This module provides a convenient Result type alias that uses
//! [`LexRedactError`] as the error type.

use super::errors::LexRedactError;

/// Result type alias for LexRedact operations
///
/// # Examples
///
/// ```
/// use lexredact::domain::result::Result;
/// use lexredact::domain::errors::LexRedactError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(LexRedactError::Configuration("missing model".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, LexRedactError>;
