//! Docket Event Provider Layer
//!
//! Event extraction adapters for external AI providers. Every adapter honors
//! the same four-key prompt contract and maps the provider response into
//! [`EventRecord`](docket_domain::EventRecord)s.
//!
//! # Architecture
//!
//! ```text
//! ProviderCatalog ─┬─> ProviderConfig (shared, immutable)
//!                  └─> Credentials (read once)
//!
//! Adapter ─> prompt ─> HttpTransport ─> retry/classify ─> parser ─> EventRecords
//! ```
//!
//! # Providers
//!
//! - `GeminiExtractor` (`langextract`): single-prompt API
//! - `OpenRouterExtractor`, `OpenCodeZenExtractor`, `OpenAiExtractor`,
//!   `DeepSeekExtractor`: chat completions
//! - `AnthropicExtractor`: messages API
//! - `MockEventExtractor`: deterministic mock for testing
//!
//! # Examples
//!
//! ```
//! use docket_llm::MockEventExtractor;
//! use docket_domain::{EventExtractor, EventRecord, Metadata};
//!
//! let extractor = MockEventExtractor::new(vec![EventRecord::new("Motion filed.", "", "")]);
//! let records = extractor.extract_events("text", &Metadata::new()).unwrap();
//! assert_eq!(records.len(), 1);
//! assert_eq!(extractor.call_count(), 1);
//! ```

#![warn(missing_docs)]

pub mod adapter;
pub mod anthropic;
pub mod chat;
pub mod config;
pub mod credentials;
pub mod deepseek;
pub mod env;
pub mod gemini;
pub mod mock;
pub mod openai;
pub mod opencode_zen;
pub mod openrouter;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod retry;
pub mod transport;

use docket_domain::FailureReason;
use thiserror::Error;

pub use adapter::AdapterContext;
pub use anthropic::AnthropicExtractor;
pub use config::{AuthScheme, ProviderCatalog, ProviderConfig, ProviderKind, ProviderStatus};
pub use credentials::{Credentials, Secret};
pub use deepseek::DeepSeekExtractor;
pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use gemini::GeminiExtractor;
pub use mock::{MockEventExtractor, ScriptedTransport};
pub use openai::OpenAiExtractor;
pub use opencode_zen::OpenCodeZenExtractor;
pub use openrouter::OpenRouterExtractor;
pub use provider::EventProvider;
pub use retry::RetryPolicy;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};

/// Errors that can occur while talking to an event provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// No credential variable for the provider holds a value
    #[error("{} required for {provider}", .vars.join(" or "))]
    MissingCredential {
        /// Provider key
        provider: String,
        /// Variable names that were checked
        vars: Vec<String>,
    },

    /// The provider rejected the credential
    #[error("Authentication failed for {provider} (HTTP {status})")]
    Authentication {
        /// Provider key
        provider: String,
        /// HTTP status returned
        status: u16,
    },

    /// Endpoint or model does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded for {0}")]
    RateLimited(String),

    /// Provider reported a gateway or availability failure
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Request exceeded its timeout (seconds)
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Response could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider configuration is unusable
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Convert into the failure reported at the adapter boundary
    pub fn into_failure(self, provider: &str) -> FailureReason {
        match self {
            LlmError::MissingCredential { .. } | LlmError::Authentication { .. } => {
                FailureReason::Authentication(provider.to_string())
            }
            LlmError::NotFound(what) => FailureReason::NotFound(what),
            LlmError::RateLimited(_) => FailureReason::RateLimited(provider.to_string()),
            LlmError::UpstreamUnavailable(_) => {
                FailureReason::UpstreamUnavailable(provider.to_string())
            }
            LlmError::Timeout(seconds) => FailureReason::Timeout {
                provider: provider.to_string(),
                seconds,
            },
            LlmError::InvalidResponse(msg) => FailureReason::InvalidResponse(msg),
            LlmError::Communication(msg) | LlmError::Configuration(msg) => {
                FailureReason::Provider(msg)
            }
        }
    }
}
