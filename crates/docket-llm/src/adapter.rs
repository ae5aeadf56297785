//! Pieces shared by every event adapter

use crate::config::ProviderConfig;
use crate::credentials::{Credentials, Secret};
use crate::parser::{ground_citations, parse_event_response};
use crate::retry::RetryPolicy;
use crate::transport::HttpTransport;
use crate::LlmError;
use docket_domain::document::document_name_from;
use docket_domain::{EventRecord, FailureReason, Metadata, TokenUsage};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Runtime collaborators handed to every adapter constructor
#[derive(Clone)]
pub struct AdapterContext {
    /// Transport used for provider requests
    pub transport: Arc<dyn HttpTransport>,
    /// Retry policy for transient failures
    pub retry: RetryPolicy,
    /// Blank citations that do not appear in the source text
    pub verify_citations: bool,
}

impl AdapterContext {
    /// Context with the default retry policy and citation verification on
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
            verify_citations: true,
        }
    }

    /// Replace the retry policy, builder style
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Toggle citation verification, builder style
    pub fn with_verify_citations(mut self, verify: bool) -> Self {
        self.verify_citations = verify;
        self
    }
}

/// Look up the provider's credential, failing when none of its variables is set
///
/// This is the adapter's own check, independent of any check the caller made.
pub fn require_credential(
    config: &ProviderConfig,
    credentials: &Credentials,
) -> Result<Secret, LlmError> {
    match credentials.first_present(&config.credential_vars) {
        Some((var, secret)) => {
            debug!("{}: credential taken from {}", config.kind, var);
            Ok(secret.clone())
        }
        None => Err(LlmError::MissingCredential {
            provider: config.kind.key().to_string(),
            vars: config.credential_vars.clone(),
        }),
    }
}

/// Source document name and whether it went through OCR
pub fn document_context(metadata: &Metadata) -> (String, bool) {
    let needs_ocr = metadata
        .get("needsOcr")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    (document_name_from(metadata), needs_ocr)
}

/// Log which document a request is about to cover
pub fn log_request(config: &ProviderConfig, text: &str, metadata: &Metadata) {
    let (document, needs_ocr) = document_context(metadata);
    debug!(
        "{}: extracting events from {} ({} chars, needsOcr={}) with {}",
        config.kind,
        document,
        text.chars().count(),
        needs_ocr,
        config.model
    );
}

/// Refuse blank input before any request is issued
pub fn check_input(text: &str) -> Result<(), FailureReason> {
    if text.trim().is_empty() {
        Err(FailureReason::EmptyDocument)
    } else {
        Ok(())
    }
}

/// Parse provider content and map it into unnumbered records
pub fn records_from_content(
    config: &ProviderConfig,
    content: &str,
    source_text: &str,
    usage: Option<TokenUsage>,
    verify_citations: bool,
) -> Result<Vec<EventRecord>, LlmError> {
    let mut events = parse_event_response(content)?;
    if verify_citations {
        ground_citations(&mut events, source_text);
    }

    info!(
        "{}: {} event(s) extracted with {}",
        config.kind,
        events.len(),
        config.model
    );

    let provider = config.kind.key();
    Ok(events
        .into_iter()
        .map(|event| {
            let mut record = EventRecord::new(event.particulars, event.citation, event.date)
                .with_provider(provider, config.model.as_str());
            record.attributes.char_interval = event.char_interval;
            record.attributes.usage = usage;
            record
        })
        .collect())
}
