//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::DeidConfig;
use super::secret::secret_string;
use crate::domain::errors::{BackendKind, LexRedactError};
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into DeidConfig
/// 4. Applies environment variable overrides (LEXREDACT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use lexredact::config::loader::load_config;
///
/// let config = load_config("lexredact.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<DeidConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(LexRedactError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        LexRedactError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: DeidConfig = toml::from_str(&contents)
        .map_err(|e| LexRedactError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        LexRedactError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Builds a configuration from defaults plus environment overrides only
///
/// Used by the CLI when no configuration file is present.
pub fn load_from_env() -> Result<DeidConfig> {
    let mut config = DeidConfig::default();
    apply_env_overrides(&mut config)?;
    config.validate().map_err(|e| {
        LexRedactError::Configuration(format!("Configuration validation failed: {}", e))
    })?;
    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are passed through untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
pub(crate) fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| LexRedactError::Other(format!("env substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(LexRedactError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using LEXREDACT_* prefix
///
/// Environment variables follow the pattern: LEXREDACT_<SECTION>_<KEY>,
/// for example LEXREDACT_PROVIDER_KIND or LEXREDACT_PIPELINE_LOCAL_CHUNK_CHARS.
fn apply_env_overrides(config: &mut DeidConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("LEXREDACT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Provider overrides
    if let Ok(val) = std::env::var("LEXREDACT_PROVIDER_KIND") {
        config.provider.kind = parse_backend_kind(&val)?;
    }
    if let Ok(val) = std::env::var("LEXREDACT_PROVIDER_MODEL") {
        config.provider.model = val;
    }
    if let Ok(val) = std::env::var("LEXREDACT_PROVIDER_TEMPERATURE") {
        config.provider.temperature = parse_override("LEXREDACT_PROVIDER_TEMPERATURE", &val)?;
    }
    if let Ok(val) = std::env::var("LEXREDACT_PROVIDER_TIMEOUT_SECONDS") {
        config.provider.timeout_seconds = Some(parse_override(
            "LEXREDACT_PROVIDER_TIMEOUT_SECONDS",
            &val,
        )?);
    }
    if let Ok(val) = std::env::var("LEXREDACT_PROVIDER_LOCAL_URL") {
        config.provider.local_url = val;
    }
    if let Ok(val) = std::env::var("LEXREDACT_PROVIDER_BASE_URL") {
        config.provider.base_url = Some(val);
    }
    if let Ok(val) = std::env::var("LEXREDACT_PROVIDER_API_KEY") {
        config.provider.api_key = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("LEXREDACT_PROVIDER_MAX_TOKENS") {
        config.provider.max_tokens = parse_override("LEXREDACT_PROVIDER_MAX_TOKENS", &val)?;
    }

    // Pipeline overrides
    if let Ok(val) = std::env::var("LEXREDACT_PIPELINE_USE_STATISTICAL_RECOGNITION") {
        config.pipeline.use_statistical_recognition =
            parse_override("LEXREDACT_PIPELINE_USE_STATISTICAL_RECOGNITION", &val)?;
    }
    if let Ok(val) = std::env::var("LEXREDACT_PIPELINE_DEGRADE_ON_RECOGNITION_FAILURE") {
        config.pipeline.degrade_on_recognition_failure =
            parse_override("LEXREDACT_PIPELINE_DEGRADE_ON_RECOGNITION_FAILURE", &val)?;
    }
    if let Ok(val) = std::env::var("LEXREDACT_PIPELINE_LOCAL_CHUNK_CHARS") {
        config.pipeline.local_chunk_chars =
            parse_override("LEXREDACT_PIPELINE_LOCAL_CHUNK_CHARS", &val)?;
    }
    if let Ok(val) = std::env::var("LEXREDACT_PIPELINE_REMOTE_CHUNK_CHARS") {
        config.pipeline.remote_chunk_chars =
            parse_override("LEXREDACT_PIPELINE_REMOTE_CHUNK_CHARS", &val)?;
    }
    if let Ok(val) = std::env::var("LEXREDACT_PIPELINE_SPLIT_OVERSIZED_PARAGRAPHS") {
        config.pipeline.split_oversized_paragraphs =
            parse_override("LEXREDACT_PIPELINE_SPLIT_OVERSIZED_PARAGRAPHS", &val)?;
    }

    // Recognition overrides
    if let Ok(val) = std::env::var("LEXREDACT_RECOGNITION_PATTERN_LIBRARY") {
        config.recognition.pattern_library = Some(PathBuf::from(val));
    }
    if let Ok(val) = std::env::var("LEXREDACT_RECOGNITION_ENTITY_MODEL") {
        config.recognition.entity_model = Some(PathBuf::from(val));
    }

    // Audit overrides
    if let Ok(val) = std::env::var("LEXREDACT_AUDIT_ENABLED") {
        config.audit.enabled = parse_override("LEXREDACT_AUDIT_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("LEXREDACT_AUDIT_LOG_PATH") {
        config.audit.log_path = PathBuf::from(val);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("LEXREDACT_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_override("LEXREDACT_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("LEXREDACT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("LEXREDACT_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}

/// Parses an override value, naming the variable when it is malformed
fn parse_override<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| {
        LexRedactError::Configuration(format!("Invalid value '{}' for {}: {}", value, name, e))
    })
}

fn parse_backend_kind(value: &str) -> Result<BackendKind> {
    match value.trim().to_ascii_lowercase().as_str() {
        "local" => Ok(BackendKind::Local),
        "remote" => Ok(BackendKind::Remote),
        other => Err(LexRedactError::Configuration(format!(
            "Invalid provider kind '{}'. Must be 'local' or 'remote'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("LEXREDACT_TEST_VAR", "test_value");
        let input = "api_key = \"${LEXREDACT_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "api_key = \"test_value\"\n");
        std::env::remove_var("LEXREDACT_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("LEXREDACT_MISSING_VAR");
        let input = "api_key = \"${LEXREDACT_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("LEXREDACT_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("LEXREDACT_COMMENTED_VAR");
        let input = "# api_key = \"${LEXREDACT_COMMENTED_VAR}\"\nmodel = \"llama3\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${LEXREDACT_COMMENTED_VAR}"));
    }

    #[test]
    fn test_parse_backend_kind() {
        assert_eq!(parse_backend_kind("Local").unwrap(), BackendKind::Local);
        assert_eq!(parse_backend_kind(" remote ").unwrap(), BackendKind::Remote);
        assert!(parse_backend_kind("cloud").is_err());
    }

    #[test]
    fn test_parse_override_rejects_malformed_values() {
        assert!(parse_override::<bool>("LEXREDACT_AUDIT_ENABLED", " true ").unwrap());
        assert_eq!(
            parse_override::<usize>("LEXREDACT_PIPELINE_LOCAL_CHUNK_CHARS", "1200").unwrap(),
            1200
        );

        let err = parse_override::<bool>("LEXREDACT_AUDIT_ENABLED", "yes").unwrap_err();
        assert!(matches!(err, LexRedactError::Configuration(_)));
        assert!(err.to_string().contains("LEXREDACT_AUDIT_ENABLED"));

        let err = parse_override::<f32>("LEXREDACT_PROVIDER_TEMPERATURE", "warm").unwrap_err();
        assert!(err.to_string().contains("LEXREDACT_PROVIDER_TEMPERATURE"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent-lexredact.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[provider]
kind = "remote"
model = "openai/gpt-4o-mini"
base_url = "https://openrouter.ai/api/v1"
api_key = "sk-file-key"
timeout_seconds = 90

[pipeline]
use_statistical_recognition = false
remote_chunk_chars = 6000
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.provider.kind, BackendKind::Remote);
        assert_eq!(config.provider.effective_timeout_seconds(), 90);
        assert!(!config.pipeline.use_statistical_recognition);
        assert_eq!(config.pipeline.remote_chunk_chars, 6000);
        assert_eq!(
            config
                .provider
                .api_key
                .as_ref()
                .map(|k| k.expose_secret().to_string()),
            Some("sk-file-key".to_string())
        );
    }

    #[test]
    fn test_load_config_invalid_fails_validation() {
        let toml_content = r#"
[provider]
kind = "remote"
model = "gpt"
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("validation failed"));
    }
}
