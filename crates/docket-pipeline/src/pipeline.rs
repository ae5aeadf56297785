//! Pipeline orchestrator
//!
//! Per document: read the file, extract events, then number the records,
//! stamp the document reference and attach timing. Every document yields at
//! least one record; a failure at either stage becomes one fallback record.

use crate::config::{AppConfig, DocumentFailurePolicy, PipelineOptions};
use crate::credentials::CredentialGate;
use crate::error::PipelineError;
use crate::registry::{self, BoxedDocumentExtractor, BoxedEventExtractor};
use docket_domain::{
    EventRecord, ExtractedDocument, ExtractionMethod, FailureReason, TimingMetrics,
};
use docket_llm::{AdapterContext, HttpTransport, ProviderKind, ReqwestTransport};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome for one input document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReport {
    /// Source file name, as stamped on every record
    pub document: String,

    /// Path as given
    pub path: PathBuf,

    /// How the document text was obtained
    pub extraction_method: ExtractionMethod,

    /// Records numbered from 1; never empty
    pub events: Vec<EventRecord>,

    /// Stage timings when instrumentation is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingMetrics>,
}

impl DocumentReport {
    /// Whether the only record stands in for a failure
    pub fn is_fallback(&self) -> bool {
        self.events.len() == 1 && self.events[0].is_fallback()
    }
}

/// Outcome for a batch of documents, in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    /// One report per input document
    pub documents: Vec<DocumentReport>,
}

impl RunReport {
    /// Every record of the run, document by document
    pub fn records(&self) -> impl Iterator<Item = &EventRecord> {
        self.documents.iter().flat_map(|d| d.events.iter())
    }

    /// Consume the report into one flat list of records
    pub fn into_records(self) -> Vec<EventRecord> {
        self.documents.into_iter().flat_map(|d| d.events).collect()
    }

    /// Number of records across all documents
    pub fn total_events(&self) -> usize {
        self.documents.iter().map(|d| d.events.len()).sum()
    }

    /// Number of documents that produced only a fallback record
    pub fn fallback_documents(&self) -> usize {
        self.documents.iter().filter(|d| d.is_fallback()).count()
    }
}

/// Runs documents through a document extractor and an event extractor
pub struct Pipeline {
    documents: BoxedDocumentExtractor,
    events: BoxedEventExtractor,
    options: PipelineOptions,
}

impl Pipeline {
    /// Assemble a pipeline from already built extractors
    pub fn new(
        documents: BoxedDocumentExtractor,
        events: BoxedEventExtractor,
        options: PipelineOptions,
    ) -> Self {
        Self {
            documents,
            events,
            options,
        }
    }

    /// Build the configured pipeline with the HTTP transport
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let transport = ReqwestTransport::new()
            .map_err(|e| PipelineError::Config(format!("HTTP client: {}", e)))?;
        Self::from_config_with_transport(config, Arc::new(transport))
    }

    /// Build the configured pipeline with an explicit transport
    ///
    /// Keys are resolved and the selected provider's credential is checked
    /// before any adapter is constructed.
    pub fn from_config_with_transport(
        config: &AppConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;

        let document_ctor = registry::document_constructor(&config.document_extractor)?;
        let event_ctor = registry::event_constructor(&config.event_extractor)?;

        let kind = ProviderKind::from_key(&config.event_extractor).ok_or_else(|| {
            PipelineError::Configuration {
                stage: "event",
                key: config.event_extractor.clone(),
                valid: registry::event_extractor_keys()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            }
        })?;
        CredentialGate::new(&config.providers).check(kind)?;

        let ctx = AdapterContext::new(transport)
            .with_retry(config.pipeline.retry_policy())
            .with_verify_citations(config.pipeline.verify_citations);
        let events = event_ctor(config, ctx)?;
        let documents = document_ctor(config)?;

        info!(
            "Pipeline ready: documents via {}, events via {} ({})",
            config.document_extractor,
            kind.key(),
            config.providers.config(kind).model
        );
        Ok(Self::new(documents, events, config.pipeline.clone()))
    }

    /// Active options
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Key of the event provider in use
    pub fn provider_key(&self) -> &str {
        self.events.provider_key()
    }

    /// Process one document
    pub fn process_document(&self, path: &Path) -> DocumentReport {
        let timed = self.options.timing_enabled;
        let total_start = timed.then(Instant::now);

        let document = self.documents.extract(path);
        let doc_elapsed = total_start.map(|start| start.elapsed());

        let event_start = timed.then(Instant::now);
        let records = self.extract_events(&document);
        let event_elapsed = event_start.map(|start| start.elapsed());

        let timing = match (total_start, doc_elapsed, event_elapsed) {
            (Some(start), Some(doc), Some(event)) => {
                Some(TimingMetrics::from_durations(doc, event, start.elapsed()))
            }
            _ => None,
        };

        let reference = document.file_name().to_string();
        let events = self.finalize(records, &reference, timing);

        if let Some(t) = &timing {
            debug!(
                "{}: document {:.3}s, events {:.3}s, total {:.3}s",
                reference, t.doc_extraction_seconds, t.event_extraction_seconds, t.total_seconds
            );
        }
        info!("{}: {} event(s)", reference, events.len());

        DocumentReport {
            document: reference,
            path: path.to_path_buf(),
            extraction_method: document.metadata.extraction_method,
            events,
            timing,
        }
    }

    /// Process documents one after another, in order
    pub fn process_documents<P: AsRef<Path>>(&self, paths: &[P]) -> RunReport {
        let documents = paths
            .iter()
            .map(|path| self.process_document(path.as_ref()))
            .collect::<Vec<_>>();

        let report = RunReport { documents };
        info!(
            "Processed {} document(s): {} event(s), {} fallback",
            report.documents.len(),
            report.total_events(),
            report.fallback_documents()
        );
        report
    }

    fn extract_events(&self, document: &ExtractedDocument) -> Vec<EventRecord> {
        if document.is_failed() && self.options.on_document_failure == DocumentFailurePolicy::Fallback
        {
            let error = document
                .metadata
                .error
                .clone()
                .unwrap_or_else(|| "unknown error".to_string());
            warn!(
                "Skipping event extraction for {}: {}",
                document.file_name(),
                error
            );
            return vec![EventRecord::fallback(
                FailureReason::DocumentUnreadable(error),
                document.file_name(),
            )];
        }

        let metadata = document.metadata.to_map();
        self.events
            .extract_events_or_fallback(&document.plain_text, &metadata)
    }

    /// Number records from 1, overwrite the document reference and attach timing
    fn finalize(
        &self,
        mut records: Vec<EventRecord>,
        reference: &str,
        timing: Option<TimingMetrics>,
    ) -> Vec<EventRecord> {
        if records.is_empty() {
            records.push(EventRecord::fallback(FailureReason::NoEvents, reference));
        }

        for (index, record) in records.iter_mut().enumerate() {
            record.sequence_number = index as u32 + 1;
            record.document_reference = reference.to_string();
            if record.attributes.provider.is_none() {
                record.attributes.provider = Some(self.events.provider_key().to_string());
            }
            if record.is_fallback() {
                warn!("{}: {}", reference, record.particulars);
            }
            record.attributes.timing = timing;
        }
        records
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("provider", &self.events.provider_key())
            .field("options", &self.options)
            .finish()
    }
}
