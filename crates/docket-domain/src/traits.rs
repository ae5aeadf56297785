//! Trait definitions for the two pluggable pipeline stages
//!
//! These traits define the boundaries between the orchestrator and the
//! adapters. Implementations live in other crates.

use crate::document::{document_name_from, ExtractedDocument, Metadata};
use crate::event::EventRecord;
use crate::failure::FailureReason;
use std::path::Path;

/// Trait for turning one file into normalized text
///
/// Implemented by the document layer (docket-document). Implementations never
/// fail past this boundary: an unreadable file comes back as an
/// [`ExtractedDocument`] whose extraction method is `failed`.
pub trait DocumentExtractor {
    /// Extract text and metadata from the file at `path`
    fn extract(&self, path: &Path) -> ExtractedDocument;

    /// Lowercase file extensions this extractor understands
    fn supported_types(&self) -> &[&'static str];
}

/// Trait for extracting events from document text with an external provider
///
/// Implemented by the provider layer (docket-llm).
pub trait EventExtractor {
    /// Registry key of the provider
    fn provider_key(&self) -> &str;

    /// Whether the required credential is present and non-empty
    ///
    /// Must not perform network I/O.
    fn is_available(&self) -> bool;

    /// Issue one request for `text` and map the response into records
    ///
    /// Returned records are unnumbered and carry no trusted document reference.
    fn extract_events(
        &self,
        text: &str,
        metadata: &Metadata,
    ) -> Result<Vec<EventRecord>, FailureReason>;

    /// Extract events, substituting a single fallback record for a failure or an
    /// empty result
    ///
    /// Never returns an empty list.
    fn extract_events_or_fallback(&self, text: &str, metadata: &Metadata) -> Vec<EventRecord> {
        let reason = match self.extract_events(text, metadata) {
            Ok(records) if !records.is_empty() => return records,
            Ok(_) => FailureReason::NoEvents,
            Err(reason) => reason,
        };
        vec![EventRecord::fallback(reason, document_name_from(metadata))]
    }
}
