//! OpenRouter adapter
//!
//! Chat completions through OpenRouter's unified API. OpenRouter asks callers
//! to identify themselves with `HTTP-Referer` and `X-Title`.

use crate::adapter::{log_request, AdapterContext};
use crate::chat::ChatCompletionsClient;
use crate::config::ProviderConfig;
use crate::credentials::Credentials;
use crate::LlmError;
use docket_domain::{EventExtractor, EventRecord, FailureReason, Metadata};
use std::sync::Arc;

/// Value sent in the `HTTP-Referer` header
pub const APP_REFERER: &str = "https://github.com/your-org/docket";

/// Value sent in the `X-Title` header
pub const APP_TITLE: &str = "Docket Legal Events";

/// Event extractor backed by OpenRouter
pub struct OpenRouterExtractor {
    client: ChatCompletionsClient,
}

impl OpenRouterExtractor {
    /// Create the adapter; fails when `OPENROUTER_API_KEY` is missing
    pub fn new(
        config: Arc<ProviderConfig>,
        credentials: &Credentials,
        ctx: AdapterContext,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: ChatCompletionsClient::new(config, credentials, ctx)?,
        })
    }

    /// Model used for requests
    pub fn model(&self) -> &str {
        &self.client.config().model
    }
}

impl EventExtractor for OpenRouterExtractor {
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
        let headers = [("HTTP-Referer", APP_REFERER), ("X-Title", APP_TITLE)];
        self.client.extract(text, true, &headers, None)
    }
}
