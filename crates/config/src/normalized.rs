//! Normalized (canonical) configuration document.
//!
//! Derived from [`crate::SuperJsonDocument`] by [`crate::normalize`]; never edited
//! directly. Every optional raw field is filled in here.

use crate::document::{
    BackoffKind, BackoffSettings, ProfileEntry, ProfileProviderEntry, ProfileProviderSettings,
    ProfileProviderSource, ProfileSettings, ProfileSource, ProviderEntry, ProviderSettings,
    RetryPolicyEntry, RetryPolicyKind, RetryPolicySettings, SecurityValues, UsecaseDefaults,
    UsecaseDefaultsMap,
};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// Default contiguous retries for circuit breakers.
pub const DEFAULT_MAX_CONTIGUOUS_RETRIES: u32 = 5;
/// Default per-request timeout (ms) for circuit breakers.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
/// Default initial backoff (ms).
pub const DEFAULT_BACKOFF_START_MS: u64 = 2_000;
/// Default backoff growth factor.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Normalized use-case defaults keyed by use-case name.
pub type NormalizedUsecaseDefaultsMap = IndexMap<String, NormalizedUsecaseDefaults>;

/// Canonical document.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NormalizedSuperJson {
    /// Normalized profiles.
    pub profiles: IndexMap<String, NormalizedProfileSettings>,
    /// Normalized providers.
    pub providers: IndexMap<String, NormalizedProviderSettings>,
}

/// Canonical profile settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedProfileSettings {
    /// Version or file (file paths without the `file://` prefix).
    #[serde(flatten)]
    pub source: ProfileSource,
    /// Profile-level defaults.
    pub defaults: NormalizedUsecaseDefaultsMap,
    /// Provider names in priority order.
    pub priority: Vec<String>,
    /// Profile-provider settings, merged over the profile-level defaults.
    pub providers: IndexMap<String, NormalizedProfileProviderSettings>,
}

/// Canonical profile-provider settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedProfileProviderSettings {
    /// Map source.
    #[serde(flatten)]
    pub source: ProfileProviderSource,
    /// Defaults merged from the profile level and this entry.
    pub defaults: NormalizedUsecaseDefaultsMap,
}

/// Canonical defaults for one use case.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedUsecaseDefaults {
    /// Default input, always present.
    pub input: Map<String, Value>,
    /// Provider failover flag (inert).
    pub provider_failover: bool,
    /// Resolved retry policy.
    pub retry_policy: RetryPolicy,
}

/// Resolved retry policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "kind")]
pub enum RetryPolicy {
    /// No retries.
    #[default]
    #[serde(rename = "none")]
    None,
    /// Circuit breaker with every parameter set.
    #[serde(rename = "circuit-breaker", rename_all = "camelCase")]
    CircuitBreaker {
        /// Contiguous retries before the breaker opens.
        max_contiguous_retries: u32,
        /// Per-request timeout in milliseconds.
        request_timeout: u64,
        /// Backoff between attempts.
        backoff: Backoff,
    },
}

impl RetryPolicy {
    /// Circuit breaker with default parameters.
    #[must_use]
    pub const fn default_circuit_breaker() -> Self {
        Self::CircuitBreaker {
            max_contiguous_retries: DEFAULT_MAX_CONTIGUOUS_RETRIES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT_MS,
            backoff: Backoff::default_exponential(),
        }
    }
}

/// Resolved backoff.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Backoff {
    /// Exponential backoff.
    #[serde(rename = "exponential")]
    Exponential {
        /// Initial delay in milliseconds.
        start: u64,
        /// Growth factor.
        factor: f64,
    },
}

impl Backoff {
    /// Exponential backoff with default parameters.
    #[must_use]
    pub const fn default_exponential() -> Self {
        Self::Exponential {
            start: DEFAULT_BACKOFF_START_MS,
            factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

/// Canonical provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct NormalizedProviderSettings {
    /// Local provider descriptor path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Env-resolved credentials, never absent.
    pub security: Vec<SecurityValues>,
    /// Env-resolved parameters, never absent.
    pub parameters: IndexMap<String, String>,
}

// =============================================================================
// BACK-CONVERSION TO RAW FULL RECORDS
// =============================================================================

impl From<&NormalizedUsecaseDefaults> for UsecaseDefaults {
    fn from(defaults: &NormalizedUsecaseDefaults) -> Self {
        Self {
            input: Some(defaults.input.clone()),
            provider_failover: Some(defaults.provider_failover),
            retry_policy: Some(RetryPolicyEntry::from(&defaults.retry_policy)),
        }
    }
}

impl From<&RetryPolicy> for RetryPolicyEntry {
    fn from(policy: &RetryPolicy) -> Self {
        match policy {
            RetryPolicy::None => Self::Kind(RetryPolicyKind::None),
            RetryPolicy::CircuitBreaker {
                max_contiguous_retries,
                request_timeout,
                backoff: Backoff::Exponential { start, factor },
            } => Self::Full(RetryPolicySettings {
                kind: RetryPolicyKind::CircuitBreaker,
                max_contiguous_retries: Some(*max_contiguous_retries),
                request_timeout: Some(*request_timeout),
                backoff: Some(BackoffSettings {
                    kind: BackoffKind::Exponential,
                    start: Some(*start),
                    factor: Some(*factor),
                }),
            }),
        }
    }
}

fn raw_defaults(defaults: &NormalizedUsecaseDefaultsMap) -> UsecaseDefaultsMap {
    defaults
        .iter()
        .map(|(usecase, defaults)| (usecase.clone(), UsecaseDefaults::from(defaults)))
        .collect()
}

impl From<&NormalizedProfileProviderSettings> for ProfileProviderEntry {
    fn from(settings: &NormalizedProfileProviderSettings) -> Self {
        Self::Full(ProfileProviderSettings {
            source: settings.source.clone(),
            defaults: Some(raw_defaults(&settings.defaults)),
        })
    }
}

impl From<&NormalizedProfileSettings> for ProfileEntry {
    fn from(settings: &NormalizedProfileSettings) -> Self {
        Self::Full(ProfileSettings {
            source: settings.source.clone(),
            defaults: Some(raw_defaults(&settings.defaults)),
            priority: Some(settings.priority.clone()),
            providers: Some(
                settings
                    .providers
                    .iter()
                    .map(|(name, provider)| (name.clone(), ProfileProviderEntry::from(provider)))
                    .collect(),
            ),
        })
    }
}

impl From<&NormalizedProviderSettings> for ProviderEntry {
    fn from(settings: &NormalizedProviderSettings) -> Self {
        Self::Full(ProviderSettings {
            file: settings.file.clone(),
            security: Some(settings.security.clone()),
            parameters: Some(settings.parameters.clone()),
        })
    }
}
