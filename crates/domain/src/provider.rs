//! Provider descriptors (`provider.json`).

use crate::SecurityScheme;
use serde::{Deserialize, Serialize};

/// A service (base URL) exposed by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderService {
    /// Service id.
    pub id: String,
    /// Base URL of the service.
    pub base_url: String,
}

/// An integration parameter declared by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderParameter {
    /// Parameter name.
    pub name: String,
    /// Default value when the configuration does not set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Human description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Provider descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderJson {
    /// Provider name.
    pub name: String,
    /// Declared services.
    pub services: Vec<ProviderService>,
    /// Id of the service used when the caller does not pick one.
    pub default_service: String,
    /// Declared credential shapes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_schemes: Vec<SecurityScheme>,
    /// Declared integration parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ProviderParameter>,
}

impl ProviderJson {
    /// Look up a service by id.
    #[must_use]
    pub fn service(&self, id: &str) -> Option<&ProviderService> {
        self.services.iter().find(|service| service.id == id)
    }
}

/// Registry listing entry for providers implementing a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    /// Registry URL of the provider definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Provider descriptor.
    pub definition: ProviderJson,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_descriptor_and_finds_services() -> Result<(), serde_json::Error> {
        let provider: ProviderJson = serde_json::from_value(json!({
            "name": "swapi",
            "services": [
                { "id": "default", "baseUrl": "https://swapi.dev/api" },
                { "id": "mirror", "baseUrl": "https://mirror.swapi.dev/api" }
            ],
            "defaultService": "default",
            "parameters": [{ "name": "region", "default": "eu" }]
        }))?;

        assert_eq!(
            provider.service("mirror").map(|service| service.base_url.as_str()),
            Some("https://mirror.swapi.dev/api")
        );
        assert!(provider.service("missing").is_none());
        assert!(provider.security_schemes.is_empty());
        assert_eq!(
            provider.parameters.first().and_then(|p| p.default.as_deref()),
            Some("eu")
        );
        Ok(())
    }
}
