//! Domain types shared across LexRedact.
//!
//! # Error Handling
//!
//! All fallible library operations return [`Result<T, LexRedactError>`] or one of
//! the stage-specific errors ([`RecognitionError`], [`GenerationError`],
//! [`PipelineError`]) which convert into it with `?`:
//!
//! ```rust
//! use lexredact::domain::{LexRedactError, Result};
//!
//! fn example() -> Result<()> {
//!     let config = lexredact::config::DeidConfig::default();
//!     config.validate().map_err(LexRedactError::Configuration)?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod result;

pub use errors::{
    BackendKind, FailureKind, GenerationError, LexRedactError, PipelineError, RecognitionError,
};
pub use result::Result;
