//! The closed set of event providers behind one interface

use crate::adapter::AdapterContext;
use crate::anthropic::AnthropicExtractor;
use crate::config::{ProviderConfig, ProviderKind};
use crate::credentials::Credentials;
use crate::deepseek::DeepSeekExtractor;
use crate::gemini::GeminiExtractor;
use crate::openai::OpenAiExtractor;
use crate::opencode_zen::OpenCodeZenExtractor;
use crate::openrouter::OpenRouterExtractor;
use crate::LlmError;
use docket_domain::{EventExtractor, EventRecord, FailureReason, Metadata};
use std::sync::Arc;

/// One variant per registered event provider
pub enum EventProvider {
    /// Google Gemini
    Gemini(GeminiExtractor),
    /// OpenRouter
    OpenRouter(OpenRouterExtractor),
    /// OpenCode Zen
    OpenCodeZen(OpenCodeZenExtractor),
    /// OpenAI
    OpenAi(OpenAiExtractor),
    /// Anthropic
    Anthropic(AnthropicExtractor),
    /// DeepSeek
    DeepSeek(DeepSeekExtractor),
}

impl EventProvider {
    /// Construct the adapter for `config.kind`
    ///
    /// Only the requested adapter is built. Fails when its credential is missing.
    pub fn build(
        config: Arc<ProviderConfig>,
        credentials: &Credentials,
        ctx: AdapterContext,
    ) -> Result<Self, LlmError> {
        Ok(match config.kind {
            ProviderKind::Gemini => Self::Gemini(GeminiExtractor::new(config, credentials, ctx)?),
            ProviderKind::OpenRouter => {
                Self::OpenRouter(OpenRouterExtractor::new(config, credentials, ctx)?)
            }
            ProviderKind::OpenCodeZen => {
                Self::OpenCodeZen(OpenCodeZenExtractor::new(config, credentials, ctx)?)
            }
            ProviderKind::OpenAi => Self::OpenAi(OpenAiExtractor::new(config, credentials, ctx)?),
            ProviderKind::Anthropic => {
                Self::Anthropic(AnthropicExtractor::new(config, credentials, ctx)?)
            }
            ProviderKind::DeepSeek => {
                Self::DeepSeek(DeepSeekExtractor::new(config, credentials, ctx)?)
            }
        })
    }

    /// Which provider this is
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Gemini(_) => ProviderKind::Gemini,
            Self::OpenRouter(_) => ProviderKind::OpenRouter,
            Self::OpenCodeZen(_) => ProviderKind::OpenCodeZen,
            Self::OpenAi(_) => ProviderKind::OpenAi,
            Self::Anthropic(_) => ProviderKind::Anthropic,
            Self::DeepSeek(_) => ProviderKind::DeepSeek,
        }
    }

    fn inner(&self) -> &dyn EventExtractor {
        match self {
            Self::Gemini(p) => p,
            Self::OpenRouter(p) => p,
            Self::OpenCodeZen(p) => p,
            Self::OpenAi(p) => p,
            Self::Anthropic(p) => p,
            Self::DeepSeek(p) => p,
        }
    }
}

impl EventExtractor for EventProvider {
    fn provider_key(&self) -> &str {
        self.kind().key()
    }

    fn is_available(&self) -> bool {
        self.inner().is_available()
    }

    fn extract_events(
        &self,
        text: &str,
        metadata: &Metadata,
    ) -> Result<Vec<EventRecord>, FailureReason> {
        self.inner().extract_events(text, metadata)
    }
}
