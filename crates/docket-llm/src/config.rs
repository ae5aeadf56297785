//! Provider configuration resolver
//!
//! Resolves, per provider key, the credential variable names, endpoint, model
//! and timeout from process configuration. Resolution happens once at startup;
//! adapters hold a shared reference to the resolved [`ProviderConfig`].

use crate::credentials::Credentials;
use crate::env::{env_parse, EnvSource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// The closed set of event providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Google Gemini (registered as `langextract`)
    Gemini,
    /// OpenRouter model gateway
    OpenRouter,
    /// OpenCode Zen legal extraction endpoint
    OpenCodeZen,
    /// OpenAI chat completions
    OpenAi,
    /// Anthropic messages API
    Anthropic,
    /// DeepSeek chat completions
    DeepSeek,
}

impl ProviderKind {
    /// Every provider, in registry order
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::Gemini,
        ProviderKind::OpenRouter,
        ProviderKind::OpenCodeZen,
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::DeepSeek,
    ];

    /// Registry key used in `EVENT_EXTRACTOR`
    pub fn key(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "langextract",
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::OpenCodeZen => "opencode_zen",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::DeepSeek => "deepseek",
        }
    }

    /// Look up a provider by registry key, ignoring case and surrounding space
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Google Gemini",
            ProviderKind::OpenRouter => "OpenRouter",
            ProviderKind::OpenCodeZen => "OpenCode Zen",
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::DeepSeek => "DeepSeek",
        }
    }

    /// One-line description used in credential errors and listings
    pub fn description(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Google Gemini structured extraction",
            ProviderKind::OpenRouter => "OpenRouter unified API access",
            ProviderKind::OpenCodeZen => "OpenCode Zen legal AI extraction",
            ProviderKind::OpenAi => "OpenAI GPT models",
            ProviderKind::Anthropic => "Anthropic Claude models",
            ProviderKind::DeepSeek => "DeepSeek chat models",
        }
    }

    /// Prefix of the `<P>_BASE_URL`, `<P>_MODEL` and `<P>_TIMEOUT` overrides
    pub fn env_prefix(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI",
            ProviderKind::OpenRouter => "OPENROUTER",
            ProviderKind::OpenCodeZen => "OPENCODEZEN",
            ProviderKind::OpenAi => "OPENAI",
            ProviderKind::Anthropic => "ANTHROPIC",
            ProviderKind::DeepSeek => "DEEPSEEK",
        }
    }

    /// Credential variable names, first present wins
    pub fn credential_vars(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            ProviderKind::OpenRouter => &["OPENROUTER_API_KEY"],
            ProviderKind::OpenCodeZen => &["OPENCODEZEN_API_KEY"],
            ProviderKind::OpenAi => &["OPENAI_API_KEY"],
            ProviderKind::Anthropic => &["ANTHROPIC_API_KEY"],
            ProviderKind::DeepSeek => &["DEEPSEEK_API_KEY"],
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderKind::OpenRouter => "https://openrouter.ai/api/v1",
            ProviderKind::OpenCodeZen => "https://api.opencode-zen.example/v1",
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::DeepSeek => "https://api.deepseek.com/v1",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-2.0-flash",
            ProviderKind::OpenRouter => "anthropic/claude-3-haiku",
            ProviderKind::OpenCodeZen => "opencode-zen/legal-extractor",
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Anthropic => "claude-3-haiku-20240307",
            ProviderKind::DeepSeek => "deepseek-chat",
        }
    }

    fn default_timeout_secs(&self) -> u64 {
        match self {
            ProviderKind::OpenRouter | ProviderKind::OpenCodeZen => 30,
            _ => 60,
        }
    }

    fn default_auth(&self) -> AuthScheme {
        match self {
            ProviderKind::Gemini => AuthScheme::Header("x-goog-api-key".to_string()),
            ProviderKind::Anthropic => AuthScheme::Header("x-api-key".to_string()),
            _ => AuthScheme::Bearer,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// How the credential is attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `<name>: <key>`
    Header(String),
}

impl AuthScheme {
    /// Header name and value carrying `key`
    pub fn header(&self, key: &str) -> (String, String) {
        match self {
            AuthScheme::Bearer => ("Authorization".to_string(), format!("Bearer {}", key)),
            AuthScheme::Header(name) => (name.clone(), key.to_string()),
        }
    }
}

/// Resolved settings for one provider
///
/// Immutable after startup. Holds credential variable *names* only; values live
/// in [`Credentials`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Which provider this configures
    pub kind: ProviderKind,

    /// Credential variable names, first present wins
    pub credential_vars: Vec<String>,

    /// API base URL without trailing slash
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,

    /// How the credential is sent
    pub auth: AuthScheme,
}

impl ProviderConfig {
    /// Built-in defaults for a provider
    pub fn defaults(kind: ProviderKind) -> Self {
        Self {
            kind,
            credential_vars: kind.credential_vars().iter().map(|v| v.to_string()).collect(),
            base_url: kind.default_base_url().to_string(),
            model: kind.default_model().to_string(),
            timeout_secs: kind.default_timeout_secs(),
            auth: kind.default_auth(),
        }
    }

    /// Defaults overlaid with `<P>_BASE_URL`, `<P>_MODEL` and `<P>_TIMEOUT`
    pub fn resolve(kind: ProviderKind, env: &dyn EnvSource) -> Self {
        let mut config = Self::defaults(kind);
        let prefix = kind.env_prefix();

        if let Some(url) = env.get_non_empty(&format!("{}_BASE_URL", prefix)) {
            config.base_url = url;
        }
        config.base_url = config.base_url.trim_end_matches('/').to_string();

        if let Some(model) = env.get_non_empty(&format!("{}_MODEL", prefix)) {
            config.model = model;
        }
        config.timeout_secs = env_parse(env, &format!("{}_TIMEOUT", prefix), config.timeout_secs);

        if kind == ProviderKind::OpenCodeZen {
            if let Some(header) = env.get_non_empty("OPENCODEZEN_AUTH_HEADER") {
                if !header.eq_ignore_ascii_case("authorization") {
                    config.auth = AuthScheme::Header(header);
                }
            }
        }

        config
    }

    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.credential_vars.is_empty() {
            return Err(format!("{}: at least one credential variable is required", self.kind));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!("{}: base_url must be an http(s) URL", self.kind));
        }
        if self.model.trim().is_empty() {
            return Err(format!("{}: model must not be empty", self.kind));
        }
        if self.timeout_secs == 0 {
            return Err(format!("{}: timeout_secs must be greater than 0", self.kind));
        }
        Ok(())
    }
}

/// Availability of one provider, as reported by [`ProviderCatalog::status`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    /// Provider
    pub kind: ProviderKind,
    /// Whether a credential is configured
    pub available: bool,
    /// Variable that supplied the credential
    pub credential_var: Option<String>,
    /// Configured model
    pub model: String,
}

/// Every provider's resolved configuration plus the captured credentials
#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    configs: BTreeMap<ProviderKind, Arc<ProviderConfig>>,
    credentials: Credentials,
}

impl ProviderCatalog {
    /// Resolve all providers and capture their credentials from `env`
    pub fn resolve(env: &dyn EnvSource) -> Self {
        let configs: BTreeMap<_, _> = ProviderKind::ALL
            .into_iter()
            .map(|kind| (kind, Arc::new(ProviderConfig::resolve(kind, env))))
            .collect();
        let vars = configs.values().flat_map(|c| c.credential_vars.iter().cloned());
        let credentials = Credentials::capture(env, vars);
        Self {
            configs,
            credentials,
        }
    }

    /// Build a catalog from explicit parts
    pub fn from_parts(
        configs: impl IntoIterator<Item = ProviderConfig>,
        credentials: Credentials,
    ) -> Self {
        let mut resolved: BTreeMap<_, _> = ProviderKind::ALL
            .into_iter()
            .map(|kind| (kind, Arc::new(ProviderConfig::defaults(kind))))
            .collect();
        for config in configs {
            resolved.insert(config.kind, Arc::new(config));
        }
        Self {
            configs: resolved,
            credentials,
        }
    }

    /// Shared configuration for a provider
    pub fn config(&self, kind: ProviderKind) -> Arc<ProviderConfig> {
        match self.configs.get(&kind) {
            Some(config) => Arc::clone(config),
            None => Arc::new(ProviderConfig::defaults(kind)),
        }
    }

    /// Captured credentials
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Availability of every provider, without network I/O
    pub fn status(&self) -> Vec<ProviderStatus> {
        ProviderKind::ALL
            .into_iter()
            .map(|kind| {
                let config = self.config(kind);
                let found = self.credentials.first_present(&config.credential_vars);
                ProviderStatus {
                    kind,
                    available: found.is_some(),
                    credential_var: found.map(|(var, _)| var.to_string()),
                    model: config.model.clone(),
                }
            })
            .collect()
    }
}
