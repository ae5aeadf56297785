//! OpenCode Zen adapter
//!
//! Chat completions against the OpenCode Zen legal extraction endpoint. The
//! credential is sent as a Bearer token unless `OPENCODEZEN_AUTH_HEADER` names
//! another header.

use crate::adapter::{log_request, AdapterContext};
use crate::chat::ChatCompletionsClient;
use crate::config::ProviderConfig;
use crate::credentials::Credentials;
use crate::LlmError;
use docket_domain::{EventExtractor, EventRecord, FailureReason, Metadata};
use std::sync::Arc;

/// Event extractor backed by OpenCode Zen
pub struct OpenCodeZenExtractor {
    client: ChatCompletionsClient,
}

impl OpenCodeZenExtractor {
    /// Create the adapter; fails when `OPENCODEZEN_API_KEY` is missing
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

impl EventExtractor for OpenCodeZenExtractor {
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
        self.client.extract(text, false, &[], None)
    }
}
