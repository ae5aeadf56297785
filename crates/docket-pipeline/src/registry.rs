//! Provider registry
//!
//! Static tables map string keys to constructors. Registering a provider
//! means adding one entry; the orchestrator never names a concrete adapter.
//! Constructors only wire configuration into adapters; they perform no I/O.

use crate::config::AppConfig;
use crate::error::PipelineError;
use docket_document::DocumentAdapter;
use docket_domain::{DocumentExtractor, EventExtractor};
use docket_llm::{AdapterContext, EventProvider, ProviderKind};

/// Boxed document extractor
pub type BoxedDocumentExtractor = Box<dyn DocumentExtractor + Send + Sync>;

/// Boxed event extractor
pub type BoxedEventExtractor = Box<dyn EventExtractor + Send + Sync>;

/// Builds a document extractor from configuration
pub type DocumentConstructor = fn(&AppConfig) -> Result<BoxedDocumentExtractor, PipelineError>;

/// Builds an event extractor from configuration and runtime collaborators
pub type EventConstructor =
    fn(&AppConfig, AdapterContext) -> Result<BoxedEventExtractor, PipelineError>;

static DOCUMENT_EXTRACTORS: [(&str, DocumentConstructor); 1] = [("native", build_native)];

static EVENT_EXTRACTORS: [(&str, EventConstructor); 6] = [
    ("langextract", build_gemini),
    ("openrouter", build_openrouter),
    ("opencode_zen", build_opencode_zen),
    ("openai", build_openai),
    ("anthropic", build_anthropic),
    ("deepseek", build_deepseek),
];

fn build_native(app: &AppConfig) -> Result<BoxedDocumentExtractor, PipelineError> {
    Ok(Box::new(DocumentAdapter::new(app.document.clone())?))
}

fn build_event(
    kind: ProviderKind,
    app: &AppConfig,
    ctx: AdapterContext,
) -> Result<BoxedEventExtractor, PipelineError> {
    let config = app.providers.config(kind);
    config.validate().map_err(PipelineError::Config)?;
    let provider = EventProvider::build(config, app.providers.credentials(), ctx)?;
    Ok(Box::new(provider))
}

fn build_gemini(app: &AppConfig, ctx: AdapterContext) -> Result<BoxedEventExtractor, PipelineError> {
    build_event(ProviderKind::Gemini, app, ctx)
}

fn build_openrouter(
    app: &AppConfig,
    ctx: AdapterContext,
) -> Result<BoxedEventExtractor, PipelineError> {
    build_event(ProviderKind::OpenRouter, app, ctx)
}

fn build_opencode_zen(
    app: &AppConfig,
    ctx: AdapterContext,
) -> Result<BoxedEventExtractor, PipelineError> {
    build_event(ProviderKind::OpenCodeZen, app, ctx)
}

fn build_openai(app: &AppConfig, ctx: AdapterContext) -> Result<BoxedEventExtractor, PipelineError> {
    build_event(ProviderKind::OpenAi, app, ctx)
}

fn build_anthropic(
    app: &AppConfig,
    ctx: AdapterContext,
) -> Result<BoxedEventExtractor, PipelineError> {
    build_event(ProviderKind::Anthropic, app, ctx)
}

fn build_deepseek(
    app: &AppConfig,
    ctx: AdapterContext,
) -> Result<BoxedEventExtractor, PipelineError> {
    build_event(ProviderKind::DeepSeek, app, ctx)
}

/// Registered document extractor keys
pub fn document_extractor_keys() -> Vec<&'static str> {
    DOCUMENT_EXTRACTORS.iter().map(|(key, _)| *key).collect()
}

/// Registered event extractor keys
pub fn event_extractor_keys() -> Vec<&'static str> {
    EVENT_EXTRACTORS.iter().map(|(key, _)| *key).collect()
}

fn lookup<T: Copy>(
    table: &[(&'static str, T)],
    stage: &'static str,
    key: &str,
) -> Result<T, PipelineError> {
    let wanted = key.trim().to_ascii_lowercase();
    table
        .iter()
        .find(|(k, _)| *k == wanted)
        .map(|(_, ctor)| *ctor)
        .ok_or_else(|| PipelineError::Configuration {
            stage,
            key: key.to_string(),
            valid: table.iter().map(|(k, _)| k.to_string()).collect(),
        })
}

/// Constructor registered for a document extractor key
pub fn document_constructor(key: &str) -> Result<DocumentConstructor, PipelineError> {
    lookup(&DOCUMENT_EXTRACTORS, "document", key)
}

/// Constructor registered for an event extractor key
pub fn event_constructor(key: &str) -> Result<EventConstructor, PipelineError> {
    lookup(&EVENT_EXTRACTORS, "event", key)
}

/// Build the document extractor registered under `key`
pub fn create_document_extractor(
    key: &str,
    app: &AppConfig,
) -> Result<BoxedDocumentExtractor, PipelineError> {
    document_constructor(key)?(app)
}

/// Build the event extractor registered under `key`
pub fn create_event_extractor(
    key: &str,
    app: &AppConfig,
    ctx: AdapterContext,
) -> Result<BoxedEventExtractor, PipelineError> {
    event_constructor(key)?(app, ctx)
}
