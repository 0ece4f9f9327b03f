//! Logging and observability
//!
//! Structured logging built on `tracing`: console output plus an optional
//! JSON rolling-file layer. The macros below give pipeline stages a uniform
//! set of fields.
//!
//! Never log document text or matched values at info level or above.
//!
//! # Example
//!
//! ```no_run
//! use lexredact::logging::init_logging;
//! use lexredact::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a pipeline stage
///
/// # Example
///
/// ```no_run
/// use lexredact::log_stage_start;
///
/// log_stage_start!("pattern_recognition", 1024);
/// ```
#[macro_export]
macro_rules! log_stage_start {
    ($stage:expr, $chars:expr) => {
        tracing::debug!(stage = $stage, input_chars = $chars, "Stage started");
    };
}

/// Log the completion of a pipeline stage
///
/// # Example
///
/// ```no_run
/// use lexredact::log_stage_complete;
/// use std::time::Duration;
///
/// log_stage_complete!("pattern_recognition", 7, Duration::from_millis(3));
/// ```
#[macro_export]
macro_rules! log_stage_complete {
    ($stage:expr, $replacements:expr, $duration:expr) => {
        tracing::info!(
            stage = $stage,
            replacements = $replacements,
            duration_ms = $duration.as_millis() as u64,
            "Stage completed"
        );
    };
}

/// Log progress through a chunked document
///
/// # Example
///
/// ```no_run
/// use lexredact::log_chunk_progress;
///
/// log_chunk_progress!(2, 5, 7900);
/// ```
#[macro_export]
macro_rules! log_chunk_progress {
    ($current:expr, $total:expr, $chars:expr) => {
        tracing::info!(
            chunk = $current,
            total = $total,
            chunk_chars = $chars,
            progress_pct = ($current as f64 / $total as f64 * 100.0),
            "Processing chunk"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use lexredact::log_error_with_context;
/// use lexredact::domain::LexRedactError;
///
/// let error = LexRedactError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
