//! Command implementations.

pub mod extract;
pub mod providers;

pub use self::extract::execute_extract;
pub use self::providers::execute_providers;

use crate::error::{CliError, Result};
use docket_llm::{EnvSource, ProcessEnv};
use docket_pipeline::AppConfig;
use std::path::Path;

/// Load configuration from `path` when given, otherwise from the environment alone.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    load_config_from(path, &ProcessEnv)
}

/// Load configuration, resolving environment overrides against `env`.
pub fn load_config_from(path: Option<&Path>, env: &dyn EnvSource) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_toml_file(path, env)
            .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))?,
        None => AppConfig::from_env(env),
    };
    Ok(config)
}
