//! Credential capture
//!
//! Credential values are read once from the configuration source and held in
//! memory only. They are never serialized and their `Debug` output is redacted.

use crate::env::EnvSource;
use std::collections::BTreeMap;
use std::fmt;

/// A credential value
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value, for placing in a request header
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the value is blank
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Credential values keyed by variable name
#[derive(Clone, Default)]
pub struct Credentials {
    values: BTreeMap<String, Secret>,
}

impl Credentials {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Read each named variable once; blank values are treated as absent
    pub fn capture(env: &dyn EnvSource, vars: impl IntoIterator<Item = String>) -> Self {
        let values = vars
            .into_iter()
            .filter_map(|var| env.get_non_empty(&var).map(|value| (var, Secret::new(value))))
            .collect();
        Self { values }
    }

    /// Add a credential, builder style
    pub fn with(mut self, var: impl Into<String>, value: impl Into<String>) -> Self {
        let secret = Secret::new(value);
        if !secret.is_blank() {
            self.values.insert(var.into(), secret);
        }
        self
    }

    /// The first variable in `vars` that holds a value, and that value
    pub fn first_present<'a>(&'a self, vars: &'a [String]) -> Option<(&'a str, &'a Secret)> {
        vars.iter()
            .find_map(|var| self.values.get(var).map(|secret| (var.as_str(), secret)))
    }

    /// Whether `var` holds a value
    pub fn contains(&self, var: &str) -> bool {
        self.values.contains_key(var)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;

    fn vars(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_first_present_wins() {
        let env = MapEnv::new()
            .with("GEMINI_API_KEY", "primary")
            .with("GOOGLE_API_KEY", "secondary");
        let wanted = vars(&["GEMINI_API_KEY", "GOOGLE_API_KEY"]);
        let creds = Credentials::capture(&env, wanted.clone());

        let (var, secret) = creds.first_present(&wanted).unwrap();
        assert_eq!(var, "GEMINI_API_KEY");
        assert_eq!(secret.expose(), "primary");
    }

    #[test]
    fn test_falls_back_to_alternative() {
        let env = MapEnv::new()
            .with("GEMINI_API_KEY", "  ")
            .with("GOOGLE_API_KEY", "secondary");
        let wanted = vars(&["GEMINI_API_KEY", "GOOGLE_API_KEY"]);
        let creds = Credentials::capture(&env, wanted.clone());

        let (var, _) = creds.first_present(&wanted).unwrap();
        assert_eq!(var, "GOOGLE_API_KEY");
    }

    #[test]
    fn test_only_named_vars_are_captured() {
        let env = MapEnv::new().with("OPENAI_API_KEY", "sk").with("HOME", "/root");
        let creds = Credentials::capture(&env, vars(&["OPENAI_API_KEY"]));
        assert!(creds.contains("OPENAI_API_KEY"));
        assert!(!creds.contains("HOME"));
    }

    #[test]
    fn test_debug_never_shows_values() {
        let creds = Credentials::new().with("OPENAI_API_KEY", "sk-very-secret");
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("OPENAI_API_KEY"));
        assert!(!rendered.contains("sk-very-secret"));
        assert_eq!(format!("{:?}", Secret::new("abc")), "Secret(***)");
    }

    #[test]
    fn test_blank_value_is_not_stored() {
        let creds = Credentials::new().with("DEEPSEEK_API_KEY", "");
        assert!(!creds.contains("DEEPSEEK_API_KEY"));
    }
}
