//! Anthropic adapter
//!
//! Uses the messages API: the contract goes in the top-level `system` field and
//! the document in a single user message.

use crate::adapter::{
    check_input, log_request, records_from_content, require_credential, AdapterContext,
};
use crate::config::ProviderConfig;
use crate::credentials::{Credentials, Secret};
use crate::prompt::{system_prompt, user_message};
use crate::retry::send_with_retry;
use crate::transport::HttpRequest;
use crate::LlmError;
use docket_domain::{EventExtractor, EventRecord, FailureReason, Metadata, TokenUsage};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

/// Value of the `anthropic-version` header
pub const API_VERSION: &str = "2023-06-01";

/// Upper bound on generated tokens per request
pub const MAX_TOKENS: u32 = 4096;

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<MessagesUsage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

/// Event extractor backed by Anthropic Claude
pub struct AnthropicExtractor {
    config: Arc<ProviderConfig>,
    api_key: Secret,
    ctx: AdapterContext,
}

impl AnthropicExtractor {
    /// Create the adapter; fails when `ANTHROPIC_API_KEY` is missing
    pub fn new(
        config: Arc<ProviderConfig>,
        credentials: &Credentials,
        ctx: AdapterContext,
    ) -> Result<Self, LlmError> {
        let api_key = require_credential(&config, credentials)?;
        Ok(Self {
            config,
            api_key,
            ctx,
        })
    }

    /// Request body for `text`
    pub fn request_body(&self, text: &str) -> Value {
        json!({
            "model": self.config.model,
            "max_tokens": MAX_TOKENS,
            "temperature": 0.0,
            "system": system_prompt(false),
            "messages": [{ "role": "user", "content": user_message(text) }],
        })
    }

    fn send(&self, text: &str) -> Result<(String, Option<TokenUsage>), LlmError> {
        let url = format!("{}/v1/messages", self.config.base_url);
        let (auth_name, auth_value) = self.config.auth.header(self.api_key.expose());
        let request = HttpRequest::new(url, self.request_body(text), self.config.timeout())
            .header(auth_name, auth_value)
            .header("anthropic-version", API_VERSION);

        let response = send_with_retry(
            self.ctx.transport.as_ref(),
            &request,
            &self.ctx.retry,
            self.config.kind.key(),
        )?;
        parse_messages_response(&response.body)
    }
}

fn parse_messages_response(body: &str) -> Result<(String, Option<TokenUsage>), LlmError> {
    let response: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    if response.stop_reason.as_deref() == Some("max_tokens") {
        warn!("anthropic: response truncated at {} tokens", MAX_TOKENS);
    }

    let text: String = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() {
        return Err(LlmError::InvalidResponse("No text content in response".to_string()));
    }

    let usage = response.usage.map(|u| TokenUsage {
        prompt_tokens: u.input_tokens,
        completion_tokens: u.output_tokens,
        cost_usd: None,
    });
    Ok((text, usage))
}

impl EventExtractor for AnthropicExtractor {
    fn provider_key(&self) -> &str {
        self.config.kind.key()
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_blank()
    }

    fn extract_events(
        &self,
        text: &str,
        metadata: &Metadata,
    ) -> Result<Vec<EventRecord>, FailureReason> {
        log_request(&self.config, text, metadata);
        check_input(text)?;
        let provider = self.config.kind.key();

        let (content, usage) = self.send(text).map_err(|e| e.into_failure(provider))?;
        records_from_content(&self.config, &content, text, usage, self.ctx.verify_citations)
            .map_err(|e| e.into_failure(provider))
    }
}
