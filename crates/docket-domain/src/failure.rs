//! Reasons an extraction stage produced no usable events

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a document yielded no events
///
/// Adapters return this at their boundary instead of raising. The orchestrator
/// turns it into a single fallback record whose particulars carry the `Display`
/// text.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// The document stage could not read the file
    #[error("document could not be read: {0}")]
    DocumentUnreadable(String),

    /// There was no text to send to the provider
    #[error("document contains no extractable text")]
    EmptyDocument,

    /// The provider answered but returned no usable events
    #[error("no events were found in the provider response")]
    NoEvents,

    /// The provider rejected the credential
    #[error("authentication with {0} failed; check the API key")]
    Authentication(String),

    /// Endpoint or model does not exist
    #[error("endpoint or model not found: {0}")]
    NotFound(String),

    /// Rate limit persisted through every retry
    #[error("rate limited by {0} after retries")]
    RateLimited(String),

    /// Provider reported itself unavailable through every retry
    #[error("{0} is temporarily unavailable")]
    UpstreamUnavailable(String),

    /// The request exceeded its timeout
    #[error("request to {provider} timed out after {seconds}s")]
    Timeout {
        /// Provider key
        provider: String,
        /// Configured timeout
        seconds: u64,
    },

    /// The response could not be interpreted
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// Any other provider-side failure
    #[error("provider error: {0}")]
    Provider(String),
}

impl FailureReason {
    /// Whether the failure came from the document stage rather than a provider
    pub fn is_document_failure(&self) -> bool {
        matches!(
            self,
            FailureReason::DocumentUnreadable(_) | FailureReason::EmptyDocument
        )
    }
}
