//! Provider handle.

use std::collections::BTreeMap;
use superface_app::ProviderConfiguration;
use superface_config::{SecurityValues, merge_security};
use superface_shared::Result;

/// A provider selected for use, with optional caller overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    configuration: ProviderConfiguration,
    document_security: Vec<SecurityValues>,
}

impl Provider {
    pub(crate) const fn new(
        configuration: ProviderConfiguration,
        document_security: Vec<SecurityValues>,
    ) -> Self {
        Self {
            configuration,
            document_security,
        }
    }

    /// Provider name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.configuration.name
    }

    /// Configuration handed to the binding pipeline.
    #[must_use]
    pub const fn configuration(&self) -> &ProviderConfiguration {
        &self.configuration
    }

    /// A copy with `security` merged by id over the current values and
    /// `parameters` overlaid on the current ones.
    #[must_use]
    pub fn configure(
        &self,
        security: &[SecurityValues],
        parameters: BTreeMap<String, String>,
    ) -> Self {
        let base = self
            .configuration
            .security
            .as_deref()
            .unwrap_or(&self.document_security);
        let merged_security = if security.is_empty() {
            self.configuration.security.clone()
        } else {
            Some(merge_security(base, security))
        };
        let mut merged_parameters = self.configuration.parameters.clone();
        merged_parameters.extend(parameters);
        Self {
            configuration: ProviderConfiguration {
                name: self.configuration.name.clone(),
                security: merged_security,
                parameters: merged_parameters,
            },
            document_security: self.document_security.clone(),
        }
    }

    /// Stable key of the effective configuration.
    pub fn cache_key(&self) -> Result<String> {
        self.configuration.cache_key()
    }
}
