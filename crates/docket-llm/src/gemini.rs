//! Google Gemini adapter (registered as `langextract`)
//!
//! Gemini takes a single prompt rather than a message array, authenticates
//! with `x-goog-api-key` and can be asked for JSON directly through
//! `generationConfig.responseMimeType`.

use crate::adapter::{
    check_input, log_request, records_from_content, require_credential, AdapterContext,
};
use crate::config::ProviderConfig;
use crate::credentials::{Credentials, Secret};
use crate::prompt::single_prompt;
use crate::retry::send_with_retry;
use crate::transport::HttpRequest;
use crate::LlmError;
use docket_domain::{EventExtractor, EventRecord, FailureReason, Metadata, TokenUsage};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

/// Event extractor backed by Google Gemini
pub struct GeminiExtractor {
    config: Arc<ProviderConfig>,
    api_key: Secret,
    ctx: AdapterContext,
}

impl GeminiExtractor {
    /// Create the adapter; fails when neither `GEMINI_API_KEY` nor `GOOGLE_API_KEY` is set
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
            "contents": [{
                "role": "user",
                "parts": [{ "text": single_prompt(text) }],
            }],
            "generationConfig": {
                "temperature": 0.0,
                "responseMimeType": "application/json",
            },
        })
    }

    fn generate(&self, text: &str) -> Result<(String, Option<TokenUsage>), LlmError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let (auth_name, auth_value) = self.config.auth.header(self.api_key.expose());
        let request = HttpRequest::new(url, self.request_body(text), self.config.timeout())
            .header(auth_name, auth_value);

        let response = send_with_retry(
            self.ctx.transport.as_ref(),
            &request,
            &self.ctx.retry,
            self.config.kind.key(),
        )?;
        parse_generate_response(&response.body)
    }
}

/// Parse a `generateContent` response body into text and usage
fn parse_generate_response(body: &str) -> Result<(String, Option<TokenUsage>), LlmError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(LlmError::InvalidResponse(format!("Prompt blocked: {}", reason)));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(LlmError::InvalidResponse("No candidate text in response".to_string()));
    }

    let usage = response.usage_metadata.map(|u| TokenUsage {
        prompt_tokens: u.prompt_token_count,
        completion_tokens: u.candidates_token_count,
        cost_usd: None,
    });
    Ok((text, usage))
}

impl EventExtractor for GeminiExtractor {
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

        let (content, usage) = self.generate(text).map_err(|e| e.into_failure(provider))?;
        records_from_content(&self.config, &content, text, usage, self.ctx.verify_citations)
            .map_err(|e| e.into_failure(provider))
    }
}
