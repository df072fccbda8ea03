//! Environment parsing helpers for CLI surfaces.

use std::collections::BTreeMap;
use superface_config::{SdkConfig, SdkEnv};
use superface_shared::ErrorEnvelope;

/// Infra-level error type (shared error envelope).
pub type InfraError = ErrorEnvelope;

/// Infra-level result type.
pub type InfraResult<T> = Result<T, InfraError>;

/// Parse SDK variables from `env` and apply them over the defaults.
pub fn load_sdk_config(env: &BTreeMap<String, String>) -> InfraResult<SdkConfig> {
    let parsed = SdkEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    Ok(SdkConfig::from_env(&parsed))
}

/// Validate that the SDK variables in `env` parse.
pub fn validate_env_parsing(env: &BTreeMap<String, String>) -> InfraResult<()> {
    load_sdk_config(env).map(|_| ())
}
