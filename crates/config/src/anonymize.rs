//! Telemetry projection of the normalized document.
//!
//! Keeps provider names, per-profile priority positions and resolved version
//! strings. File paths, credentials, parameters and defaults are dropped.

use crate::document::{ProfileProviderSource, ProfileSource};
use crate::normalized::NormalizedSuperJson;
use serde::Serialize;
use std::collections::BTreeMap;

/// Version marker for file-backed profiles and maps.
pub const FILE_VERSION: &str = "file";

/// Canonically ordered projection; serialize it to get the hash input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnonymizedSuperJson {
    /// Profiles sorted by id.
    pub profiles: BTreeMap<String, AnonymizedProfile>,
    /// Declared provider names, sorted.
    pub providers: Vec<String>,
}

/// Projection of one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnonymizedProfile {
    /// Resolved version, or `file`.
    pub version: String,
    /// Profile providers ordered by priority, then name.
    pub providers: Vec<AnonymizedProfileProvider>,
}

/// Projection of one profile provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnonymizedProfileProvider {
    /// Provider name.
    pub provider: String,
    /// Position in the profile priority list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<usize>,
    /// `file`, the pinned map revision, or absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Project a normalized document.
#[must_use]
pub fn anonymize(normalized: &NormalizedSuperJson) -> AnonymizedSuperJson {
    let profiles = normalized
        .profiles
        .iter()
        .map(|(id, settings)| {
            let version = match &settings.source {
                ProfileSource::Version(version) => version.clone(),
                ProfileSource::File(_) => FILE_VERSION.to_owned(),
            };
            let mut providers: Vec<_> = settings
                .providers
                .iter()
                .map(|(name, provider)| AnonymizedProfileProvider {
                    provider: name.clone(),
                    priority: settings.priority.iter().position(|entry| entry == name),
                    version: match &provider.source {
                        ProfileProviderSource::File { .. } => Some(FILE_VERSION.to_owned()),
                        ProfileProviderSource::Remote { map_revision, .. } => map_revision.clone(),
                    },
                })
                .collect();
            providers.sort_by(|left, right| {
                (left.priority.is_none(), left.priority, &left.provider).cmp(&(
                    right.priority.is_none(),
                    right.priority,
                    &right.provider,
                ))
            });
            (id.clone(), AnonymizedProfile { version, providers })
        })
        .collect();

    let mut providers: Vec<String> = normalized.providers.keys().cloned().collect();
    providers.sort();

    AnonymizedSuperJson {
        profiles,
        providers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SuperJsonDocument;
    use crate::env::Environment;
    use crate::normalize::normalize_super_json;
    use serde_json::json;

    fn normalized(value: serde_json::Value) -> Result<NormalizedSuperJson, Box<dyn std::error::Error>> {
        let document: SuperJsonDocument = serde_json::from_value(value)?;
        Ok(normalize_super_json(&document, &Environment::empty())?)
    }

    #[test]
    fn strips_paths_and_credentials() -> Result<(), Box<dyn std::error::Error>> {
        let projection = anonymize(&normalized(json!({
            "profiles": {
                "mail/send": {
                    "version": "1.2.0",
                    "priority": ["b", "a"],
                    "providers": { "a": "file://secret/a.suma", "b": { "mapRevision": "4" } }
                },
                "local": "file://profiles/local.supr"
            },
            "providers": {
                "b": { "security": [{ "id": "k", "apikey": "top-secret" }] },
                "a": "file://a.json"
            }
        }))?);

        assert_eq!(
            serde_json::to_value(&projection)?,
            json!({
                "profiles": {
                    "local": { "version": "file", "providers": [] },
                    "mail/send": {
                        "version": "1.2.0",
                        "providers": [
                            { "provider": "b", "priority": 0, "version": "4" },
                            { "provider": "a", "priority": 1, "version": "file" }
                        ]
                    }
                },
                "providers": ["a", "b"]
            })
        );
        let text = serde_json::to_string(&projection)?;
        assert!(!text.contains("secret") && !text.contains(".json"));
        Ok(())
    }

    #[test]
    fn projection_ignores_insertion_order() -> Result<(), Box<dyn std::error::Error>> {
        let left = anonymize(&normalized(json!({
            "profiles": { "x": "1.0.0", "y": "2.0.0" },
            "providers": { "a": {}, "b": {} }
        }))?);
        let right = anonymize(&normalized(json!({
            "profiles": { "y": "2.0.0", "x": "1.0.0" },
            "providers": { "b": {}, "a": {} }
        }))?);
        assert_eq!(left, right);
        Ok(())
    }
}
