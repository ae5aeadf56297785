//! Process-wide configuration, resolved once at startup
//!
//! Values come from built-in defaults, then an optional TOML file, then the
//! environment. Credentials are only ever read from the environment.

use docket_document::{AcceleratorDevice, DocumentConfig, TableMode};
use docket_llm::env::{env_bool, env_parse};
use docket_llm::{EnvSource, ProviderCatalog, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default document extractor key
pub const DEFAULT_DOCUMENT_EXTRACTOR: &str = "native";

/// Default event extractor key
pub const DEFAULT_EVENT_EXTRACTOR: &str = "langextract";

/// What to do when a document cannot be read at all
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFailurePolicy {
    /// Skip the provider and emit one fallback record naming the read error
    #[default]
    Fallback,
    /// Call the provider with the empty text anyway
    Attempt,
}

impl FromStr for DocumentFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fallback" => Ok(DocumentFailurePolicy::Fallback),
            "attempt" => Ok(DocumentFailurePolicy::Attempt),
            other => Err(format!("unknown document failure policy '{}'", other)),
        }
    }
}

impl fmt::Display for DocumentFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentFailurePolicy::Fallback => "fallback",
            DocumentFailurePolicy::Attempt => "attempt",
        })
    }
}

/// Orchestrator toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Measure stage timings and attach them to records
    pub timing_enabled: bool,

    /// Behavior for documents whose extraction failed
    pub on_document_failure: DocumentFailurePolicy,

    /// Blank citations that do not appear in the source text
    pub verify_citations: bool,

    /// Attempts per provider request, including the first
    pub max_retries: u32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            timing_enabled: false,
            on_document_failure: DocumentFailurePolicy::Fallback,
            verify_citations: true,
            max_retries: RetryPolicy::default().max_attempts,
        }
    }
}

impl PipelineOptions {
    /// Retry policy for provider requests
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            ..RetryPolicy::default()
        }
    }

    /// Validate the options
    pub fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 {
            return Err("max_retries must be greater than 0".to_string());
        }
        if self.max_retries > 10 {
            return Err("max_retries cannot exceed 10".to_string());
        }
        Ok(())
    }
}

/// Sections accepted in a TOML configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    document_extractor: Option<String>,
    event_extractor: Option<String>,
    document: Option<DocumentConfig>,
    pipeline: Option<PipelineOptions>,
}

/// Everything the pipeline needs, resolved once
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Registry key of the document extractor
    pub document_extractor: String,

    /// Registry key of the event extractor
    pub event_extractor: String,

    /// Document adapter settings
    pub document: DocumentConfig,

    /// Orchestrator toggles
    pub pipeline: PipelineOptions,

    /// Provider settings and captured credentials
    pub providers: ProviderCatalog,
}

impl AppConfig {
    /// Resolve configuration from defaults and `env`
    pub fn from_env(env: &dyn EnvSource) -> Self {
        let mut config = Self::defaults(env);
        config.apply_env(env);
        config
    }

    /// Resolve configuration from defaults, the TOML file at `path`, then `env`
    pub fn from_toml_file(path: &Path, env: &dyn EnvSource) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let mut config = Self::defaults(env);
        config.apply_toml(&raw)?;
        config.apply_env(env);
        Ok(config)
    }

    /// Overlay values from a TOML string onto this configuration
    pub fn apply_toml(&mut self, toml_str: &str) -> Result<(), String> {
        let file: FileConfig =
            toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))?;
        if let Some(key) = file.document_extractor {
            self.document_extractor = key;
        }
        if let Some(key) = file.event_extractor {
            self.event_extractor = key;
        }
        if let Some(document) = file.document {
            self.document = document;
        }
        if let Some(pipeline) = file.pipeline {
            self.pipeline = pipeline;
        }
        Ok(())
    }

    /// Serialize the non-secret settings to a TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        let file = FileConfig {
            document_extractor: Some(self.document_extractor.clone()),
            event_extractor: Some(self.event_extractor.clone()),
            document: Some(self.document.clone()),
            pipeline: Some(self.pipeline.clone()),
        };
        toml::to_string_pretty(&file).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), String> {
        if self.document_extractor.trim().is_empty() {
            return Err("document_extractor must not be empty".to_string());
        }
        if self.event_extractor.trim().is_empty() {
            return Err("event_extractor must not be empty".to_string());
        }
        self.document.validate()?;
        self.pipeline.validate()
    }

    fn defaults(env: &dyn EnvSource) -> Self {
        Self {
            document_extractor: DEFAULT_DOCUMENT_EXTRACTOR.to_string(),
            event_extractor: DEFAULT_EVENT_EXTRACTOR.to_string(),
            document: DocumentConfig::default(),
            pipeline: PipelineOptions::default(),
            providers: ProviderCatalog::resolve(env),
        }
    }

    fn apply_env(&mut self, env: &dyn EnvSource) {
        if let Some(key) = env.get_non_empty("DOC_EXTRACTOR") {
            self.document_extractor = key.to_ascii_lowercase();
        }
        if let Some(key) = env.get_non_empty("EVENT_EXTRACTOR") {
            self.event_extractor = key.to_ascii_lowercase();
        }

        let doc = &mut self.document;
        doc.do_ocr = env_bool(env, "DOCUMENT_DO_OCR", doc.do_ocr);
        doc.auto_ocr_detection = env_bool(env, "DOCUMENT_AUTO_OCR_DETECTION", doc.auto_ocr_detection);
        doc.detection_sample_pages =
            env_parse(env, "DOCUMENT_OCR_SAMPLE_PAGES", doc.detection_sample_pages);
        doc.detection_min_chars = env_parse(env, "DOCUMENT_OCR_MIN_CHARS", doc.detection_min_chars);
        doc.table_mode = env_parse::<TableMode>(env, "DOCUMENT_TABLE_MODE", doc.table_mode);
        doc.accelerator_device =
            env_parse::<AcceleratorDevice>(env, "DOCUMENT_ACCELERATOR_DEVICE", doc.accelerator_device);
        doc.accelerator_threads =
            env_parse(env, "DOCUMENT_ACCELERATOR_THREADS", doc.accelerator_threads);
        doc.document_timeout_secs = env_parse(env, "DOCUMENT_TIMEOUT", doc.document_timeout_secs);
        if let Some(command) = env.get_non_empty("DOCUMENT_OCR_COMMAND") {
            doc.ocr_command = command;
        }
        if let Some(language) = env.get_non_empty("DOCUMENT_OCR_LANGUAGE") {
            doc.ocr_language = language;
        }

        let opts = &mut self.pipeline;
        opts.timing_enabled = env_bool(env, "ENABLE_PERFORMANCE_TIMING", opts.timing_enabled);
        opts.on_document_failure =
            env_parse(env, "ON_DOCUMENT_FAILURE", opts.on_document_failure);
        opts.verify_citations = env_bool(env, "VERIFY_CITATIONS", opts.verify_citations);
        opts.max_retries = env_parse(env, "PROVIDER_MAX_RETRIES", opts.max_retries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_llm::{MapEnv, ProviderKind};

    #[test]
    fn test_defaults_from_empty_env() {
        let config = AppConfig::from_env(&MapEnv::new());
        assert_eq!(config.document_extractor, "native");
        assert_eq!(config.event_extractor, "langextract");
        assert!(!config.document.do_ocr);
        assert!(config.document.auto_ocr_detection);
        assert!(!config.pipeline.timing_enabled);
        assert_eq!(config.pipeline.on_document_failure, DocumentFailurePolicy::Fallback);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env = MapEnv::new()
            .with("EVENT_EXTRACTOR", "OpenAI")
            .with("DOCUMENT_DO_OCR", "yes")
            .with("DOCUMENT_TABLE_MODE", "accurate")
            .with("DOCUMENT_ACCELERATOR_DEVICE", "cuda")
            .with("DOCUMENT_TIMEOUT", "120")
            .with("ENABLE_PERFORMANCE_TIMING", "1")
            .with("ON_DOCUMENT_FAILURE", "attempt")
            .with("PROVIDER_MAX_RETRIES", "5")
            .with("OPENAI_MODEL", "gpt-4o");
        let config = AppConfig::from_env(&env);

        assert_eq!(config.event_extractor, "openai");
        assert!(config.document.do_ocr);
        assert_eq!(config.document.table_mode, TableMode::Accurate);
        assert_eq!(config.document.accelerator_device, AcceleratorDevice::Cuda);
        assert_eq!(config.document.document_timeout_secs, 120);
        assert!(config.pipeline.timing_enabled);
        assert_eq!(config.pipeline.on_document_failure, DocumentFailurePolicy::Attempt);
        assert_eq!(config.pipeline.retry_policy().max_attempts, 5);
        assert_eq!(config.providers.config(ProviderKind::OpenAi).model, "gpt-4o");
    }

    #[test]
    fn test_unparsable_values_keep_defaults() {
        let env = MapEnv::new()
            .with("DOCUMENT_OCR_MIN_CHARS", "lots")
            .with("ENABLE_PERFORMANCE_TIMING", "maybe")
            .with("ON_DOCUMENT_FAILURE", "explode");
        let config = AppConfig::from_env(&env);

        assert_eq!(config.document.detection_min_chars, 50);
        assert!(!config.pipeline.timing_enabled);
        assert_eq!(config.pipeline.on_document_failure, DocumentFailurePolicy::Fallback);
    }

    #[test]
    fn test_toml_overlay_then_env() {
        let toml_str = r#"
            event_extractor = "anthropic"

            [document]
            detection_min_chars = 80
            table_mode = "accurate"

            [pipeline]
            timing_enabled = true
        "#;
        let mut config = AppConfig::from_env(&MapEnv::new());
        config.apply_toml(toml_str).unwrap();

        assert_eq!(config.event_extractor, "anthropic");
        assert_eq!(config.document.detection_min_chars, 80);
        assert_eq!(config.document.table_mode, TableMode::Accurate);
        assert_eq!(config.document.detection_sample_pages, 3);
        assert!(config.pipeline.timing_enabled);
        assert!(config.pipeline.verify_citations);
    }

    #[test]
    fn test_toml_file_with_env_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docket.toml");
        std::fs::write(&path, "event_extractor = \"deepseek\"\n[pipeline]\nmax_retries = 2\n").unwrap();

        let env = MapEnv::new().with("PROVIDER_MAX_RETRIES", "4");
        let config = AppConfig::from_toml_file(&path, &env).unwrap();
        assert_eq!(config.event_extractor, "deepseek");
        assert_eq!(config.pipeline.max_retries, 4);
    }

    #[test]
    fn test_toml_rejects_unknown_sections() {
        let mut config = AppConfig::from_env(&MapEnv::new());
        let result = config.apply_toml("[credentials]\nOPENAI_API_KEY = \"sk-test\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_toml_round_trip_has_no_credentials() {
        let env = MapEnv::new().with("OPENAI_API_KEY", "sk-secret-value");
        let config = AppConfig::from_env(&env);
        let toml_str = config.to_toml().unwrap();
        assert!(!toml_str.contains("sk-secret-value"));

        let mut restored = AppConfig::from_env(&MapEnv::new());
        restored.apply_toml(&toml_str).unwrap();
        assert_eq!(restored.document, config.document);
        assert_eq!(restored.pipeline, config.pipeline);
    }

    #[test]
    fn test_invalid_retry_count() {
        let options = PipelineOptions {
            max_retries: 0,
            ..PipelineOptions::default()
        };
        assert!(options.validate().is_err());
    }
}
