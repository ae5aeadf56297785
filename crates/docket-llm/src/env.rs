//! Process configuration source
//!
//! Configuration is read through [`EnvSource`] so that it can be resolved from
//! the real process environment in production and from a fixed map in tests.

use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

/// Read-only view of named configuration values
pub trait EnvSource {
    /// Value of `name`, if set
    fn get(&self, name: &str) -> Option<String>;

    /// Value of `name` if set and non-blank, trimmed
    fn get_non_empty(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// A fixed set of values, used in tests and for embedding
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    values: HashMap<String, String>,
}

impl MapEnv {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, builder style
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Add a value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl EnvSource for MapEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// Parse a boolean flag, accepting `1/true/yes/on` and `0/false/no/off`
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag, keeping `default` when unset or unparsable
pub fn env_bool(env: &dyn EnvSource, name: &str, default: bool) -> bool {
    match env.get_non_empty(name) {
        None => default,
        Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
            warn!("Ignoring {}={:?}: expected a boolean, using {}", name, raw, default);
            default
        }),
    }
}

/// Read and parse a value, keeping `default` when unset or unparsable
pub fn env_parse<T>(env: &dyn EnvSource, name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env.get_non_empty(name) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring {}={:?}: unparsable, using {:?}", name, raw, default);
            default
        }),
    }
}
