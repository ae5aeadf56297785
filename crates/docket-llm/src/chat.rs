//! OpenAI-compatible chat completions client
//!
//! OpenRouter, OpenCode Zen, OpenAI and DeepSeek all speak this wire format;
//! their adapters differ only in headers, JSON-mode support and pricing.

use crate::adapter::{check_input, records_from_content, require_credential, AdapterContext};
use crate::config::ProviderConfig;
use crate::credentials::{Credentials, Secret};
use crate::prompt::{system_prompt, user_message};
use crate::retry::send_with_retry;
use crate::transport::HttpRequest;
use crate::LlmError;
use docket_domain::{EventRecord, FailureReason, TokenUsage};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Text and token usage of one completion
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Assistant message content
    pub content: String,
    /// Token usage, when reported
    pub usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Chat completions client bound to one provider's configuration and credential
pub struct ChatCompletionsClient {
    config: Arc<ProviderConfig>,
    api_key: Secret,
    ctx: AdapterContext,
}

impl ChatCompletionsClient {
    /// Create a client, failing when the provider's credential is missing
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

    /// Provider configuration
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Whether a non-blank credential is held
    pub fn has_credential(&self) -> bool {
        !self.api_key.is_blank()
    }

    /// Request body for `text`
    pub fn request_body(&self, text: &str, json_object: bool) -> Value {
        let mut body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system_prompt(json_object) },
                { "role": "user", "content": user_message(text) },
            ],
            "temperature": 0.0,
        });
        if json_object {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }

    /// Issue one completion request
    pub fn complete(
        &self,
        text: &str,
        json_object: bool,
        extra_headers: &[(&str, &str)],
    ) -> Result<Completion, LlmError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let (auth_name, auth_value) = self.config.auth.header(self.api_key.expose());

        let mut request = HttpRequest::new(url, self.request_body(text, json_object), self.config.timeout())
            .header(auth_name, auth_value);
        for (name, value) in extra_headers {
            request = request.header(*name, *value);
        }

        let response = send_with_retry(
            self.ctx.transport.as_ref(),
            &request,
            &self.ctx.retry,
            self.config.kind.key(),
        )?;
        parse_completion(&response.body)
    }

    /// Run one extraction: guard input, request, parse, attribute
    ///
    /// `price` turns token usage into a dollar estimate when the provider has
    /// a price table.
    pub fn extract(
        &self,
        text: &str,
        json_object: bool,
        extra_headers: &[(&str, &str)],
        price: Option<fn(&str, &TokenUsage) -> f64>,
    ) -> Result<Vec<EventRecord>, FailureReason> {
        check_input(text)?;
        let provider = self.config.kind.key();

        let completion = self
            .complete(text, json_object, extra_headers)
            .map_err(|e| e.into_failure(provider))?;
        let usage = completion.usage.map(|mut usage| {
            if let Some(price) = price {
                usage.cost_usd = Some(price(&self.config.model, &usage));
            }
            usage
        });

        records_from_content(
            &self.config,
            &completion.content,
            text,
            usage,
            self.ctx.verify_citations,
        )
        .map_err(|e| e.into_failure(provider))
    }
}

/// Parse a chat completions response body
pub fn parse_completion(body: &str) -> Result<Completion, LlmError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?
        .message
        .content
        .unwrap_or_default();
    if content.trim().is_empty() {
        return Err(LlmError::InvalidResponse("Empty message content".to_string()));
    }

    Ok(Completion {
        content,
        usage: response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            cost_usd: None,
        }),
    })
}
