//! Audit log of de-identification runs
//!
//! One JSON line per processed document. Replaced values are stored only as
//! SHA-256 hashes so the log can be retained without leaking what it records.

use crate::deidentification::models::{EntityCategory, PipelineResult};
use crate::deidentification::registry::RegistryEntry;
use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Audit log entry
#[derive(Debug, Serialize)]
struct AuditLogEntry {
    run_id: String,
    timestamp: String,
    pipeline_used: String,
    provider: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
    processing_time_ms: u64,
    replacements_count: usize,
    counts: BTreeMap<EntityCategory, usize>,
    replacements: Vec<AuditReplacement>,
}

/// Audit replacement entry (with hashed surface form)
#[derive(Debug, Serialize)]
struct AuditReplacement {
    category: EntityCategory,
    method: String,
    placeholder: String,
    /// SHA-256 hash of the original value (never log plaintext)
    value_hash: String,
}

/// Audit logger for de-identification runs
pub struct AuditLogger {
    log_path: PathBuf,
    enabled: bool,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(log_path: impl Into<PathBuf>, enabled: bool) -> Result<Self> {
        let log_path = log_path.into();
        if enabled {
            if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create audit log directory: {}", parent.display())
                })?;
            }
        }

        Ok(Self { log_path, enabled })
    }

    /// A logger that records nothing
    pub fn disabled() -> Self {
        Self {
            log_path: PathBuf::new(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Record one processed document and the replacements made for it
    pub fn log_document(&self, result: &PipelineResult, entries: &[RegistryEntry]) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let entry = AuditLogEntry {
            run_id: result.run_id.to_string(),
            timestamp: result.timestamp.to_rfc3339(),
            pipeline_used: result.pipeline_used.to_string(),
            provider: result.provider.to_string(),
            success: result.success,
            failure: result.error.as_ref().map(|e| format!("{:?}", e.kind)),
            processing_time_ms: result.processing_time_ms,
            replacements_count: entries.len(),
            counts: result.stats.by_category.clone(),
            replacements: entries.iter().map(audit_replacement).collect(),
        };

        self.write_entry(&entry)
    }

    /// Write an audit entry to the log file
    fn write_entry(&self, entry: &AuditLogEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open audit log: {}", self.log_path.display()))?;

        let json_line = serde_json::to_string(entry).context("Failed to serialize audit entry")?;
        writeln!(file, "{json_line}").context("Failed to write audit entry")?;

        Ok(())
    }
}

fn audit_replacement(entry: &RegistryEntry) -> AuditReplacement {
    AuditReplacement {
        category: entry.placeholder.category,
        method: format!("{:?}", entry.method).to_lowercase(),
        placeholder: entry.placeholder.to_string(),
        value_hash: hash_value(&entry.surface),
    }
}

/// Hash a surface form using SHA-256
fn hash_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deidentification::models::{
        DetectionMethod, PipelineUsed, RecognitionStats,
    };
    use crate::deidentification::registry::PlaceholderRegistry;
    use crate::domain::BackendKind;
    use chrono::Utc;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn result(stats: RecognitionStats) -> PipelineResult {
        PipelineResult {
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            success: true,
            cleaned_text: Some("Гражданин А.".to_string()),
            preprocessed_text: None,
            original_length: 10,
            cleaned_length: 12,
            stats,
            stages: Vec::new(),
            pipeline_used: PipelineUsed::NerAndLlm,
            degraded: false,
            provider: BackendKind::Local,
            model: "llama3".to_string(),
            processing_time_ms: 5,
            error: None,
        }
    }

    #[test]
    fn test_hash_value() {
        assert_eq!(hash_value("+7-701-234-56-78"), hash_value("+7-701-234-56-78"));
        assert_ne!(hash_value("+7-701-234-56-78"), hash_value("+7-701-234-56-79"));
        assert_eq!(hash_value("").len(), 64);
    }

    #[test]
    fn test_log_document_never_writes_plaintext() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit").join("deid.log");
        let logger = AuditLogger::new(&log_path, true).unwrap();

        let mut registry = PlaceholderRegistry::new();
        registry.get_or_create("Иванов Иван", EntityCategory::Person, DetectionMethod::Statistical);
        registry.get_or_create("+7-701-234-56-78", EntityCategory::Phone, DetectionMethod::Pattern);

        let result = result(registry.stats());
        logger.log_document(&result, registry.entries()).unwrap();
        logger.log_document(&result, registry.entries()).unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(!content.contains("Иванов"));
        assert!(!content.contains("701-234"));
        assert!(content.contains("[ЛИЦО-1]"));
        assert!(content.contains(&hash_value("Иванов Иван")));

        let line: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(line["pipeline_used"], "NER + LLM");
        assert_eq!(line["replacements_count"], 2);
        assert_eq!(line["counts"]["PERSON"], 1);
    }

    #[test]
    fn test_disabled_logger_writes_nothing() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("deid.log");
        let logger = AuditLogger::new(&log_path, false).unwrap();

        logger.log_document(&result(RecognitionStats::default()), &[]).unwrap();
        assert!(!log_path.exists());
        assert!(!AuditLogger::disabled().is_enabled());
    }
}
