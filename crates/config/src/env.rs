//! Environment snapshot, `$NAME` substitution and SDK env parsing.
//!
//! This module keeps env parsing:
//! - strict (invalid SDK settings fail fast)
//! - lenient for document substitution (unresolved `$NAME` stays as-is, with a warning)
//! - safe (secret values are redacted in error metadata)

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use superface_shared::{ErrorCode, ErrorEnvelope, REDACTED_VALUE, SecretString, is_secret_key};
use url::Url;

/// Env var: registry base URL.
pub const ENV_API_URL: &str = "SUPERFACE_API_URL";
/// Env var: SDK auth token (secret).
// gitleaks:allow
pub const ENV_SDK_TOKEN: &str = "SUPERFACE_SDK_TOKEN";
/// Env var: configuration document path.
pub const ENV_SUPERFACE_PATH: &str = "SUPERFACE_PATH";

/// Default registry URL.
pub const DEFAULT_API_URL: &str = "https://superface.ai";
/// Default configuration document path, relative to the working directory.
pub const DEFAULT_SUPER_JSON_PATH: &str = "superface/super.json";

// =============================================================================
// ENVIRONMENT SNAPSHOT
// =============================================================================

/// Immutable snapshot of environment variables.
///
/// Substitution reads from the snapshot, never from the live process env, so
/// tests inject variables through [`Environment::from_map`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Empty environment.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            vars: BTreeMap::new(),
        }
    }

    /// Snapshot from an explicit map.
    #[must_use]
    pub fn from_map(map: BTreeMap<String, String>) -> Self {
        Self { vars: map }
    }

    /// Snapshot of the current process environment.
    #[must_use]
    pub fn from_std_env() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Look up a variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Underlying map.
    #[must_use]
    pub const fn as_map(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// Substitute a `$NAME` reference.
    ///
    /// Values not starting with `$` are returned unchanged. Unset variables are
    /// left as-is and a warning is emitted.
    #[must_use]
    pub fn resolve_str(&self, value: &str) -> String {
        let Some(name) = value.strip_prefix('$') else {
            return value.to_owned();
        };
        match self.get(name) {
            Some(resolved) => resolved.to_owned(),
            None => {
                tracing::warn!(variable = name, "environment variable is not set");
                value.to_owned()
            },
        }
    }

    /// Substitute every string leaf of a JSON value.
    #[must_use]
    pub fn resolve_value(&self, value: Value) -> Value {
        match value {
            Value::String(raw) => Value::String(self.resolve_str(&raw)),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|item| self.resolve_value(item)).collect())
            },
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, item)| (key, self.resolve_value(item)))
                    .collect(),
            ),
            other => other,
        }
    }
}

// =============================================================================
// SDK ENV
// =============================================================================

/// Env parse errors for SDK settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// A secret env var was present but empty after trimming.
    EmptySecret {
        /// Env var name.
        var: &'static str,
    },
    /// URL env var had an invalid value.
    InvalidUrl {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } | Self::EmptySecret { .. } => {
                ErrorCode::new("config", "empty_env_var")
            },
            Self::InvalidUrl { .. } => ErrorCode::new("config", "invalid_env_url"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } | Self::EmptySecret { var } => {
                write!(formatter, "{var} must be non-empty")
            },
            Self::InvalidUrl { var, .. } => write!(formatter, "{var} must be a valid URL"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } | EnvParseError::EmptySecret { var } => {
                envelope.with_metadata("env_var", var)
            },
            EnvParseError::InvalidUrl { var, value } => {
                let value = if is_secret_key(var) {
                    REDACTED_VALUE.to_owned()
                } else {
                    value
                };
                envelope
                    .with_metadata("env_var", var)
                    .with_metadata("value", value)
            },
        }
    }
}

/// Parsed SDK env vars (unset vars stay `None`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SdkEnv {
    /// `SUPERFACE_API_URL`
    pub api_url: Option<Box<str>>,
    /// `SUPERFACE_SDK_TOKEN`
    pub sdk_token: Option<SecretString>,
    /// `SUPERFACE_PATH`
    pub superface_path: Option<Box<str>>,
}

impl SdkEnv {
    /// Parse SDK env vars from a map.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            api_url: parse_optional_url(map, ENV_API_URL)?,
            sdk_token: parse_optional_token(map, ENV_SDK_TOKEN)?,
            superface_path: parse_optional_string(map, ENV_SUPERFACE_PATH)?,
        })
    }

    /// Parse SDK env vars from an environment snapshot.
    pub fn from_environment(environment: &Environment) -> Result<Self, EnvParseError> {
        Self::from_map(environment.as_map())
    }

    /// Parse SDK env vars from the process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let mut map = BTreeMap::new();
        for name in [ENV_API_URL, ENV_SDK_TOKEN, ENV_SUPERFACE_PATH] {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_string(), value);
            }
        }
        Self::from_map(&map)
    }
}

/// Effective SDK settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkConfig {
    /// Registry base URL, without trailing slash.
    pub registry_url: String,
    /// Optional SDK token sent to the registry.
    pub sdk_token: Option<SecretString>,
    /// Configuration document path.
    pub super_json_path: PathBuf,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_API_URL.to_owned(),
            sdk_token: None,
            super_json_path: PathBuf::from(DEFAULT_SUPER_JSON_PATH),
        }
    }
}

impl SdkConfig {
    /// Apply parsed env vars over the defaults.
    #[must_use]
    pub fn from_env(env: &SdkEnv) -> Self {
        let defaults = Self::default();
        Self {
            registry_url: env
                .api_url
                .as_deref()
                .map_or(defaults.registry_url, |url| url.trim_end_matches('/').to_owned()),
            sdk_token: env.sdk_token.clone(),
            super_json_path: env
                .superface_path
                .as_deref()
                .map_or(defaults.super_json_path, PathBuf::from),
        }
    }

    /// Parse the process environment and apply it over the defaults.
    pub fn from_std_env() -> Result<Self, ErrorEnvelope> {
        let env = SdkEnv::from_std_env().map_err(ErrorEnvelope::from)?;
        Ok(Self::from_env(&env))
    }
}

fn parse_optional_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }
    Ok(Some(trimmed.to_owned().into_boxed_str()))
}

fn parse_optional_url(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(trimmed) = parse_optional_string(map, var)? else {
        return Ok(None);
    };
    let parsed = Url::parse(&trimmed).map_err(|_| EnvParseError::InvalidUrl {
        var,
        value: trimmed.to_string(),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(EnvParseError::InvalidUrl {
            var,
            value: trimmed.to_string(),
        });
    }
    Ok(Some(trimmed))
}

fn parse_optional_token(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<SecretString>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptySecret { var });
    }
    if !is_valid_sdk_token(trimmed) {
        tracing::warn!(env_var = var, "SDK token has an unexpected format and is ignored");
        return Ok(None);
    }
    Ok(Some(SecretString::new(trimmed)))
}

/// `sfs_<name>_<8 hex digits>`
fn is_valid_sdk_token(token: &str) -> bool {
    let Some(rest) = token.strip_prefix("sfs_") else {
        return false;
    };
    let Some((name, checksum)) = rest.rsplit_once('_') else {
        return false;
    };
    !name.is_empty() && checksum.len() == 8 && checksum.bytes().all(|byte| byte.is_ascii_hexdigit())
}
