//! Event module - the canonical output unit

use crate::failure::FailureReason;
use crate::timing::TimingMetrics;
use serde::{Deserialize, Serialize};

/// Prefix placed before the reason in a fallback record's particulars
pub const FALLBACK_PREFIX: &str = "extraction failed";

/// Half-open character range `[start, end)` into the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharInterval {
    /// First character offset
    pub start: usize,
    /// One past the last character offset
    pub end: usize,
}

/// Token counts and optional cost reported for one provider request
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Tokens sent to the provider
    pub prompt_tokens: u64,
    /// Tokens generated by the provider
    pub completion_tokens: u64,
    /// Estimated cost in US dollars, when the provider has a price table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
}

impl TokenUsage {
    /// Sum of prompt and completion tokens
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Optional attributes carried alongside the five canonical fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAttributes {
    /// Provider key that produced the record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Model identifier used for the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Location of the citation in the source text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char_interval: Option<CharInterval>,

    /// Document-level timing, identical across a document's records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingMetrics>,

    /// Token usage of the request that produced the record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,

    /// Set on synthesized fallback records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FailureReason>,
}

/// One row of the canonical output table
///
/// `date` and `citation` are empty strings when absent, never placeholders.
/// `document_reference` is assigned by the orchestrator from the source file
/// name; whatever a provider returns for it is discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// 1-based position within the document's result set
    pub sequence_number: u32,

    /// Date mentioned for the event, or empty
    pub date: String,

    /// Description of what happened
    pub particulars: String,

    /// Verbatim legal authority cited, or empty
    pub citation: String,

    /// Source file name
    pub document_reference: String,

    /// Optional attributes
    #[serde(default)]
    pub attributes: EventAttributes,
}

impl EventRecord {
    /// Create an unnumbered record with no document reference
    pub fn new(
        particulars: impl Into<String>,
        citation: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            sequence_number: 0,
            date: date.into(),
            particulars: particulars.into(),
            citation: citation.into(),
            document_reference: String::new(),
            attributes: EventAttributes::default(),
        }
    }

    /// Synthesize the single record emitted when a document yields no events
    ///
    /// Citation and date are left empty; the reason is kept in attributes.
    pub fn fallback(reason: FailureReason, document_reference: impl Into<String>) -> Self {
        Self {
            sequence_number: 1,
            date: String::new(),
            particulars: format!("{}: {}", FALLBACK_PREFIX, reason),
            citation: String::new(),
            document_reference: document_reference.into(),
            attributes: EventAttributes {
                fallback_reason: Some(reason),
                ..EventAttributes::default()
            },
        }
    }

    /// Attach the provider and model that produced this record
    pub fn with_provider(mut self, provider: impl Into<String>, model: impl Into<String>) -> Self {
        self.attributes.provider = Some(provider.into());
        self.attributes.model = Some(model.into());
        self
    }

    /// Whether this record was synthesized to stand in for a failure
    pub fn is_fallback(&self) -> bool {
        self.attributes.fallback_reason.is_some()
    }

    /// Whether the record carries a non-empty citation
    pub fn has_citation(&self) -> bool {
        !self.citation.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_defaults() {
        let record = EventRecord::new("Complaint filed.", "", "");
        assert_eq!(record.sequence_number, 0);
        assert_eq!(record.citation, "");
        assert_eq!(record.date, "");
        assert!(record.document_reference.is_empty());
        assert!(!record.is_fallback());
        assert!(!record.has_citation());
    }

    #[test]
    fn test_fallback_record_shape() {
        let record = EventRecord::fallback(FailureReason::NoEvents, "brief.pdf");

        assert_eq!(record.sequence_number, 1);
        assert!(record.particulars.starts_with("extraction failed: "));
        assert!(record.particulars.len() > "extraction failed: ".len());
        assert_eq!(record.citation, "");
        assert_eq!(record.date, "");
        assert_eq!(record.document_reference, "brief.pdf");
        assert!(record.is_fallback());
    }

    #[test]
    fn test_with_provider() {
        let record = EventRecord::new("x", "", "").with_provider("openai", "gpt-4o-mini");
        assert_eq!(record.attributes.provider.as_deref(), Some("openai"));
        assert_eq!(record.attributes.model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage {
            prompt_tokens: 1200,
            completion_tokens: 300,
            cost_usd: None,
        };
        assert_eq!(usage.total_tokens(), 1500);
    }
}
