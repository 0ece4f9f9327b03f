//! CLI command implementations
//!
//! Exit codes: 0 success, 1 pipeline or model failure, 2 configuration
//! error, 4 backend unreachable, 5 fatal error.

pub mod check;
pub mod clean;
pub mod init;
pub mod preprocess;
pub mod validate;

use crate::config::{load_config, load_from_env, DeidConfig};
use crate::domain::Result;
use std::path::Path;

/// Load the configuration file, or defaults plus environment overrides when
/// the file does not exist
pub fn resolve_config(config_path: &str) -> Result<DeidConfig> {
    if Path::new(config_path).exists() {
        load_config(config_path)
    } else {
        tracing::info!(
            config_path = %config_path,
            "Configuration file not found, using defaults and environment"
        );
        load_from_env()
    }
}
