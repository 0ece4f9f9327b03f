//! Integration tests for configuration loading and validation
//!
//! Tests that touch LEXREDACT_* variables hold ENV_MUTEX so they do not
//! interfere with each other.

use lexredact::config::{load_config, load_from_env};
use lexredact::domain::BackendKind;
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const OVERRIDE_VARS: &[&str] = &[
    "LEXREDACT_APPLICATION_LOG_LEVEL",
    "LEXREDACT_PROVIDER_KIND",
    "LEXREDACT_PROVIDER_MODEL",
    "LEXREDACT_PROVIDER_API_KEY",
    "LEXREDACT_PIPELINE_LOCAL_CHUNK_CHARS",
    "LEXREDACT_PIPELINE_USE_STATISTICAL_RECOGNITION",
    "LEXREDACT_PROVIDER_TEMPERATURE",
    "TEST_LEXREDACT_API_KEY",
];

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    for var in OVERRIDE_VARS {
        std::env::remove_var(var);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[application]
log_level = "debug"

[provider]
kind = "remote"
model = "anthropic/claude-3-haiku"
temperature = 0.2
timeout_seconds = 90
base_url = "https://openrouter.ai/api/v1"
api_key = "sk-or-test"
max_tokens = 8000

[pipeline]
use_statistical_recognition = false
degrade_on_recognition_failure = false
local_chunk_chars = 4000
remote_chunk_chars = 10000
split_oversized_paragraphs = true

[recognition]
min_location_chars = 5
location_stoplist = ["город"]

[audit]
enabled = true
log_path = "/tmp/lexredact/audit.log"

[logging]
local_enabled = true
local_path = "/tmp/lexredact/logs"
local_rotation = "hourly"
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.provider.kind, BackendKind::Remote);
    assert_eq!(config.provider.effective_timeout_seconds(), 90);
    assert_eq!(config.provider.endpoint(), Some("https://openrouter.ai/api/v1"));
    assert_eq!(config.provider.max_tokens, 8000);
    assert!(!config.pipeline.use_statistical_recognition);
    assert!(config.pipeline.split_oversized_paragraphs);
    assert_eq!(config.pipeline.chunk_chars_for(BackendKind::Remote), 10000);
    assert_eq!(config.recognition.min_location_chars, 5);
    assert!(config.audit.enabled);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_with_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config("[provider]\nmodel = \"qwen2:7b\"\n");
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "info");
    assert_eq!(config.provider.kind, BackendKind::Local);
    assert_eq!(config.provider.model, "qwen2:7b");
    assert_eq!(config.provider.effective_timeout_seconds(), 300);
    assert_eq!(config.provider.endpoint(), Some("http://localhost:11434"));
    assert!(config.pipeline.use_statistical_recognition);
    assert!(config.pipeline.degrade_on_recognition_failure);
    assert_eq!(config.pipeline.chunk_chars_for(BackendKind::Local), 8000);
    assert!(!config.audit.enabled);
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_LEXREDACT_API_KEY", "sk-from-env");

    let temp_file = write_config(
        r#"
[provider]
kind = "remote"
base_url = "https://api.openai.com/v1"
api_key = "${TEST_LEXREDACT_API_KEY}"
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");
    let api_key = config.provider.api_key.unwrap();
    assert_eq!(api_key.expose_secret().to_string(), "sk-from-env");

    cleanup_env_vars();
}

#[test]
fn test_missing_substitution_variable_fails() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[provider]
kind = "remote"
base_url = "https://api.openai.com/v1"
api_key = "${TEST_LEXREDACT_API_KEY}"
"#,
    );

    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_LEXREDACT_API_KEY"));
}

#[test]
fn test_env_var_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("LEXREDACT_APPLICATION_LOG_LEVEL", "trace");
    std::env::set_var("LEXREDACT_PROVIDER_MODEL", "mistral");
    std::env::set_var("LEXREDACT_PIPELINE_LOCAL_CHUNK_CHARS", "2500");
    std::env::set_var("LEXREDACT_PIPELINE_USE_STATISTICAL_RECOGNITION", "false");

    let temp_file = write_config(
        r#"
[application]
log_level = "info"

[provider]
model = "llama3"

[pipeline]
local_chunk_chars = 8000
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "trace");
    assert_eq!(config.provider.model, "mistral");
    assert_eq!(config.pipeline.local_chunk_chars, 2500);
    assert!(!config.pipeline.use_statistical_recognition);

    cleanup_env_vars();
}

#[test]
fn test_malformed_env_overrides_are_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    std::env::set_var("LEXREDACT_PIPELINE_USE_STATISTICAL_RECOGNITION", "flase");
    let err = load_from_env().unwrap_err();
    assert!(err
        .to_string()
        .contains("LEXREDACT_PIPELINE_USE_STATISTICAL_RECOGNITION"));

    cleanup_env_vars();
    std::env::set_var("LEXREDACT_PIPELINE_LOCAL_CHUNK_CHARS", "2k");
    let err = load_from_env().unwrap_err();
    assert!(err.to_string().contains("LEXREDACT_PIPELINE_LOCAL_CHUNK_CHARS"));

    cleanup_env_vars();
    std::env::set_var("LEXREDACT_PROVIDER_TEMPERATURE", "warm");
    assert!(load_from_env().is_err());

    cleanup_env_vars();
}

#[test]
fn test_load_from_env_without_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("LEXREDACT_PROVIDER_KIND", "remote");

    // Remote without base URL or key cannot validate
    assert!(load_from_env().is_err());

    std::env::set_var("LEXREDACT_PROVIDER_KIND", "local");
    let config = load_from_env().expect("defaults should validate");
    assert_eq!(config.provider.kind, BackendKind::Local);

    cleanup_env_vars();
}

#[test]
fn test_invalid_config_validation() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    for content in [
        "[application]\nlog_level = \"invalid_level\"\n",
        "[provider]\ntemperature = 3.5\n",
        "[provider]\nkind = \"remote\"\nbase_url = \"https://api.example.com\"\n",
        "[provider]\nlocal_url = \"ftp://localhost\"\n",
        "[pipeline]\nlocal_chunk_chars = 0\n",
    ] {
        let temp_file = write_config(content);
        let result = load_config(temp_file.path());
        assert!(result.is_err(), "expected validation failure for:\n{content}");
    }
}

#[test]
fn test_missing_file_is_error() {
    let err = load_config("/nonexistent/lexredact.toml").unwrap_err();
    assert!(err.to_string().contains("not found"));
}
