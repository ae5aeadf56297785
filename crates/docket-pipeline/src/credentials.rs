//! Credential gate
//!
//! Checks the selected provider's credential before any adapter is built.
//! Only the selected provider is inspected, so a missing key for any other
//! provider never blocks a run.

use crate::error::PipelineError;
use docket_llm::{ProviderCatalog, ProviderKind};
use tracing::{error, info};

/// Pre-construction credential check for the selected event provider
#[derive(Debug, Clone, Copy)]
pub struct CredentialGate<'a> {
    catalog: &'a ProviderCatalog,
}

impl<'a> CredentialGate<'a> {
    /// Create a gate over the captured credentials
    pub fn new(catalog: &'a ProviderCatalog) -> Self {
        Self { catalog }
    }

    /// Ensure `kind` has a non-empty credential
    ///
    /// Returns the name of the variable that supplied it.
    pub fn check(&self, kind: ProviderKind) -> Result<String, PipelineError> {
        let config = self.catalog.config(kind);
        match self.catalog.credentials().first_present(&config.credential_vars) {
            Some((var, _)) => {
                info!("Credential gate passed for {} ({} is set)", kind.key(), var);
                Ok(var.to_string())
            }
            None => {
                error!(
                    "Credential gate failed for {}: set {}",
                    kind.key(),
                    config.credential_vars.join(" or ")
                );
                Err(PipelineError::Validation {
                    provider: kind.key().to_string(),
                    vars: config.credential_vars.clone(),
                    description: kind.display_name().to_string(),
                })
            }
        }
    }
}
