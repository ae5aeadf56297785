//! OpenAI adapter
//!
//! Chat completions with JSON mode for the models that support it and a cost
//! estimate from the published per-token prices.

use crate::adapter::{log_request, AdapterContext};
use crate::chat::ChatCompletionsClient;
use crate::config::ProviderConfig;
use crate::credentials::Credentials;
use crate::LlmError;
use docket_domain::{EventExtractor, EventRecord, FailureReason, Metadata, TokenUsage};
use std::sync::Arc;

/// USD per one million (input, output) tokens, longest prefix first
const PRICES_PER_MILLION: [(&str, f64, f64); 4] = [
    ("gpt-4o-mini", 0.15, 0.60),
    ("gpt-4o", 2.50, 10.00),
    ("gpt-4-turbo", 10.00, 30.00),
    ("gpt-3.5-turbo", 0.50, 1.50),
];

/// Whether `model` accepts `response_format: json_object`
pub fn supports_json_mode(model: &str) -> bool {
    model.starts_with("gpt-4o")
        || model.starts_with("gpt-4-turbo")
        || model.starts_with("gpt-3.5-turbo-1106")
        || model.starts_with("gpt-3.5-turbo-0125")
}

/// Estimated cost of a request in USD
///
/// Unknown models are priced as `gpt-4o-mini`.
pub fn estimate_cost(model: &str, usage: &TokenUsage) -> f64 {
    let (input, output) = PRICES_PER_MILLION
        .iter()
        .find(|(prefix, _, _)| model.starts_with(prefix))
        .map(|(_, input, output)| (*input, *output))
        .unwrap_or((PRICES_PER_MILLION[0].1, PRICES_PER_MILLION[0].2));

    (usage.prompt_tokens as f64 * input + usage.completion_tokens as f64 * output) / 1_000_000.0
}

/// Event extractor backed by OpenAI
pub struct OpenAiExtractor {
    client: ChatCompletionsClient,
    json_mode: bool,
}

impl OpenAiExtractor {
    /// Create the adapter; fails when `OPENAI_API_KEY` is missing
    pub fn new(
        config: Arc<ProviderConfig>,
        credentials: &Credentials,
        ctx: AdapterContext,
    ) -> Result<Self, LlmError> {
        let json_mode = supports_json_mode(&config.model);
        Ok(Self {
            client: ChatCompletionsClient::new(config, credentials, ctx)?,
            json_mode,
        })
    }

    /// Whether requests use JSON mode
    pub fn json_mode(&self) -> bool {
        self.json_mode
    }
}

impl EventExtractor for OpenAiExtractor {
    fn provider_key(&self) -> &str {
        self.client.config().kind.key()
    }

    fn is_available(&self) -> bool {
        self.client.has_credential()
    }

    fn extract_events(
        &self,
        text: &str,
        metadata: &Metadata,
    ) -> Result<Vec<EventRecord>, FailureReason> {
        log_request(self.client.config(), text, metadata);
        self.client
            .extract(text, self.json_mode, &[], Some(estimate_cost))
    }
}
