//! DeepSeek adapter
//!
//! DeepSeek exposes an OpenAI-compatible chat completions endpoint with JSON
//! output mode.

use crate::adapter::{log_request, AdapterContext};
use crate::chat::ChatCompletionsClient;
use crate::config::ProviderConfig;
use crate::credentials::Credentials;
use crate::LlmError;
use docket_domain::{EventExtractor, EventRecord, FailureReason, Metadata};
use std::sync::Arc;

/// Event extractor backed by DeepSeek
pub struct DeepSeekExtractor {
    client: ChatCompletionsClient,
}

impl DeepSeekExtractor {
    /// Create the adapter; fails when `DEEPSEEK_API_KEY` is missing
    pub fn new(
        config: Arc<ProviderConfig>,
        credentials: &Credentials,
        ctx: AdapterContext,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: ChatCompletionsClient::new(config, credentials, ctx)?,
        })
    }
}

impl EventExtractor for DeepSeekExtractor {
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
        self.client.extract(text, true, &[], None)
    }
}
