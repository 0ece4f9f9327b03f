//! Integration tests for the de-identification pipeline with a scripted model

use async_trait::async_trait;
use lexredact::adapters::llm::{ConnectionStatus, GenerativeBackend, PromptTemplate};
use lexredact::config::{PipelineConfig, RecognitionConfig};
use lexredact::deidentification::models::{PipelineUsed, Stage, StageStatus};
use lexredact::deidentification::{
    AuditLogger, DeidPipeline, EntityRecognizer, PatternRecognizer, ProcessOptions,
};
use lexredact::domain::{BackendKind, FailureKind, GenerationError};
use std::sync::{Arc, Mutex};

const CASE_TEXT: &str =
    "Иванов Иван Иванович, тел. +7-701-234-56-78, проживает по адресу ул. Ленина, д. 5, кв. 10.";

/// Backend that answers with the document part of each prompt
struct EchoBackend {
    prompts: Mutex<Vec<String>>,
    fail_on_call: Option<usize>,
}

impl EchoBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
            fail_on_call: None,
        })
    }

    fn failing_on(call: usize) -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
            fail_on_call: Some(call),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

fn strip_template(prompt: &str) -> String {
    [PromptTemplate::Finalization, PromptTemplate::DirectRedaction]
        .iter()
        .find_map(|t| prompt.strip_prefix(t.render("").as_str()))
        .unwrap_or(prompt)
        .to_string()
}

#[async_trait]
impl GenerativeBackend for EchoBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn endpoint(&self) -> &str {
        "mock://echo"
    }

    fn model(&self) -> &str {
        "echo"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let call = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };

        if self.fail_on_call == Some(call) {
            return Err(GenerationError::ConnectionFailed {
                backend: BackendKind::Local,
                endpoint: "mock://echo".to_string(),
                reason: "connection reset".to_string(),
            });
        }

        // Yield so concurrent documents interleave
        tokio::task::yield_now().await;
        Ok(strip_template(prompt))
    }

    async fn check_connection(&self) -> Result<ConnectionStatus, GenerationError> {
        Ok(ConnectionStatus {
            connected: true,
            model_available: true,
            available_models: vec!["echo".to_string()],
            requested_model: "echo".to_string(),
        })
    }
}

fn build_pipeline(
    backend: Arc<EchoBackend>,
    recognition: &RecognitionConfig,
    pipeline: &PipelineConfig,
) -> DeidPipeline {
    DeidPipeline::with_components(
        PatternRecognizer::from_config(recognition).unwrap(),
        EntityRecognizer::from_config(recognition),
        backend,
        pipeline,
    )
}

#[tokio::test]
async fn test_end_to_end_removes_identifiers() {
    let backend = EchoBackend::new();
    let pipeline = build_pipeline(
        backend.clone(),
        &RecognitionConfig::default(),
        &PipelineConfig::default(),
    );

    let result = pipeline.process(CASE_TEXT, &ProcessOptions::default()).await;

    assert!(result.success, "{:?}", result.error);
    let cleaned = result.cleaned_text.clone().unwrap();
    assert!(!cleaned.contains("Иванов"));
    assert!(!cleaned.contains("234-56-78"));
    assert!(!cleaned.contains("Ленина"));

    let prompts = backend.prompts();
    assert_eq!(prompts.len(), 1);
    for placeholder in ["[ЛИЦО-1]", "[ТЕЛЕФОН]", "[АДРЕС-1]"] {
        assert!(prompts[0].contains(placeholder), "missing {placeholder}");
    }

    assert_eq!(result.pipeline_used, PipelineUsed::NerAndLlm);
    assert_eq!(result.provider, BackendKind::Local);
    assert_eq!(result.model, "echo");
    assert_eq!(result.original_length, CASE_TEXT.chars().count());
    for stage in [Stage::PatternRecognition, Stage::EntityRecognition, Stage::Rewriting] {
        assert_eq!(result.stage_status(stage), Some(StageStatus::Completed));
    }
}

#[tokio::test]
async fn test_missing_entity_model_degrades_to_llm_only() {
    let backend = EchoBackend::new();
    let recognition = RecognitionConfig {
        entity_model: Some("/nonexistent/ru_kk.toml".into()),
        ..Default::default()
    };
    let pipeline = build_pipeline(backend.clone(), &recognition, &PipelineConfig::default());
    assert!(!pipeline.entity_recognition_available());

    let result = pipeline.process(CASE_TEXT, &ProcessOptions::default()).await;

    assert!(result.success);
    assert!(result.degraded);
    assert_eq!(result.pipeline_used, PipelineUsed::LlmOnly);

    // Patterns still ran; the model is asked to redact names itself
    let prompt = &backend.prompts()[0];
    assert!(prompt.starts_with(PromptTemplate::DirectRedaction.render("").as_str()));
    assert!(prompt.contains("[ТЕЛЕФОН]"));
    assert!(prompt.contains("Иванов"));
}

#[tokio::test]
async fn test_missing_entity_model_without_degradation_fails() {
    let backend = EchoBackend::new();
    let recognition = RecognitionConfig {
        entity_model: Some("/nonexistent/ru_kk.toml".into()),
        ..Default::default()
    };
    let pipeline = build_pipeline(backend.clone(), &recognition, &PipelineConfig::default());
    let options = ProcessOptions {
        degrade_on_recognition_failure: false,
        ..Default::default()
    };

    let result = pipeline.process(CASE_TEXT, &options).await;

    assert!(!result.success);
    assert_eq!(result.error.unwrap().kind, FailureKind::RecognitionUnavailable);
    assert!(backend.prompts().is_empty());
}

#[tokio::test]
async fn test_chunk_failure_discards_whole_document() {
    let backend = EchoBackend::failing_on(2);
    let config = PipelineConfig {
        local_chunk_chars: 100,
        ..Default::default()
    };
    let pipeline = build_pipeline(backend.clone(), &RecognitionConfig::default(), &config);
    let paragraph = "Суд рассмотрел материалы дела в открытом заседании.";
    let text = vec![paragraph; 4].join("\n\n");

    let result = pipeline.process(&text, &ProcessOptions::default()).await;

    assert!(!result.success);
    assert!(result.cleaned_text.is_none());
    assert_eq!(backend.prompts().len(), 2);

    let error = result.error.unwrap();
    assert_eq!(error.kind, FailureKind::ChunkProcessingFailed);
    assert_eq!(error.stage, Stage::Rewriting);
    assert!(error.message.contains("connection reset"));
}

#[tokio::test]
async fn test_multi_chunk_document_keeps_order() {
    let backend = EchoBackend::new();
    let config = PipelineConfig {
        local_chunk_chars: 80,
        ..Default::default()
    };
    let pipeline = build_pipeline(backend.clone(), &RecognitionConfig::default(), &config);
    let paragraphs = [
        "Первый абзац решения суда без персональных данных.",
        "Второй абзац решения суда без персональных данных.",
        "Третий абзац решения суда без персональных данных.",
    ];
    let text = paragraphs.join("\n\n");

    let result = pipeline.process(&text, &ProcessOptions::default()).await;

    assert!(result.success);
    assert_eq!(result.stats.chunk_count, 3);
    assert_eq!(result.cleaned_text.as_deref(), Some(text.as_str()));
}

#[tokio::test]
async fn test_concurrent_documents_have_independent_registries() {
    let backend = EchoBackend::new();
    let pipeline = Arc::new(build_pipeline(
        backend,
        &RecognitionConfig::default(),
        &PipelineConfig::default(),
    ));

    let documents = [
        CASE_TEXT,
        "Истец Сейтказиев Нурлан Бауыржанұлы обратился в суд.",
        "Судья Ахметова А.Б. огласила решение.",
    ];

    let handles: Vec<_> = documents
        .iter()
        .map(|doc| {
            let pipeline = Arc::clone(&pipeline);
            let doc = doc.to_string();
            tokio::spawn(async move { pipeline.process(&doc, &ProcessOptions::default()).await })
        })
        .collect();

    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.success);
        let cleaned = result.cleaned_text.unwrap();
        // Numbering restarts for every document
        assert!(cleaned.contains("[ЛИЦО-1]"), "{cleaned}");
        assert!(!cleaned.contains("[ЛИЦО-2]"), "{cleaned}");
        assert_eq!(result.stats.statistical_replacements, 1);
    }
}

#[tokio::test]
async fn test_audit_log_records_hashed_replacements() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("audit.log");
    let pipeline = build_pipeline(
        EchoBackend::new(),
        &RecognitionConfig::default(),
        &PipelineConfig::default(),
    )
    .with_audit(AuditLogger::new(&log_path, true).unwrap());

    let result = pipeline.process(CASE_TEXT, &ProcessOptions::default()).await;
    assert!(result.success);

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(log.lines().count(), 1);
    assert!(log.contains(&result.run_id.to_string()));
    assert!(!log.contains("Иванов"));
    assert!(!log.contains("Ленина"));
}
