//! Read-only inspection of a configuration document for CLI surfaces.

use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use superface_adapters::LocalFileSystem;
use superface_app::{detect_super_json, load_super_json};
use superface_config::{AnonymizedSuperJson, Environment, SdkConfig, SuperJson};
use superface_shared::{REDACTED, RequestContext, is_secret_key};

use crate::InfraResult;

/// Locate the document nearest to `cwd` on the local disk.
pub async fn detect_document(cwd: &Path) -> Option<PathBuf> {
    let ctx = RequestContext::new_request();
    detect_super_json(&ctx, &LocalFileSystem::new(None), cwd).await
}

/// Load and schema-validate the document at `path`.
pub async fn load_document(path: &Path, environment: Environment) -> InfraResult<SuperJson> {
    let ctx = RequestContext::new_request();
    load_super_json(&ctx, &LocalFileSystem::new(None), path, environment).await
}

/// Normalized document as JSON with credential values redacted.
pub fn normalized_document(super_json: &SuperJson) -> InfraResult<Value> {
    let normalized = super_json.normalized()?;
    let mut value = serde_json::to_value(normalized.as_ref())?;
    redact_secrets(&mut value);
    Ok(value)
}

/// Telemetry projection together with its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymizedSummary {
    /// Projection.
    pub anonymized: AnonymizedSuperJson,
    /// Hash of the canonical projection.
    pub config_hash: String,
}

/// Project `super_json` for telemetry.
pub fn anonymized_summary(super_json: &SuperJson) -> InfraResult<AnonymizedSummary> {
    Ok(AnonymizedSummary {
        anonymized: super_json.anonymized()?,
        config_hash: super_json.config_hash()?,
    })
}

/// Printable view of the effective SDK settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkConfigSummary {
    /// Registry base URL.
    pub registry_url: String,
    /// `[REDACTED]` when a token is configured.
    pub sdk_token: Option<String>,
    /// Document path.
    pub super_json_path: String,
}

/// Summarize `config` without exposing the token.
#[must_use]
pub fn sdk_config_summary(config: &SdkConfig) -> SdkConfigSummary {
    SdkConfigSummary {
        registry_url: config.registry_url.clone(),
        sdk_token: config.sdk_token.as_ref().map(|_| REDACTED.to_owned()),
        super_json_path: config.super_json_path.to_string_lossy().to_string(),
    }
}

/// Replace string values under secret-looking keys, recursively.
pub fn redact_secrets(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if entry.is_string() && is_secret_key(key) {
                    *entry = Value::from(REDACTED);
                } else {
                    redact_secrets(entry);
                }
            }
        },
        Value::Array(items) => items.iter_mut().for_each(redact_secrets),
        _ => {},
    }
}
