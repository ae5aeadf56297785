//! Error types for the pipeline

use docket_document::DocumentError;
use docket_llm::LlmError;
use thiserror::Error;

/// Errors that stop a pipeline before or outside per-document processing
///
/// Per-document extraction failures never surface here; they become fallback
/// records.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Unknown provider key
    #[error("Unknown {stage} extractor '{key}'; valid keys: {}", .valid.join(", "))]
    Configuration {
        /// Which registry was consulted (`document` or `event`)
        stage: &'static str,
        /// Key that was requested
        key: String,
        /// Registered keys
        valid: Vec<String>,
    },

    /// Known provider without a usable credential
    #[error("{} required for {provider} ({description})", .vars.join(" or "))]
    Validation {
        /// Provider key
        provider: String,
        /// Credential variables that were checked
        vars: Vec<String>,
        /// Human readable provider name
        description: String,
    },

    /// Event provider construction failed
    #[error("Event provider error: {0}")]
    Provider(#[from] LlmError),

    /// Document adapter construction failed
    #[error("Document extractor error: {0}")]
    Document(#[from] DocumentError),

    /// A record does not fit the output schema
    #[error("Schema violation: {0}")]
    Schema(String),

    /// Records could not be exported
    #[error("Export error: {0}")]
    Export(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Whether this is a configuration or credential problem the user must fix
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            PipelineError::Configuration { .. }
                | PipelineError::Validation { .. }
                | PipelineError::Config(_)
        )
    }
}

impl From<csv::Error> for PipelineError {
    fn from(e: csv::Error) -> Self {
        PipelineError::Export(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for PipelineError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        PipelineError::Export(e.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::Export(e.to_string())
    }
}
