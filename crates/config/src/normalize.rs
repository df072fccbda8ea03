//! Normalization engine: raw entries to canonical records.
//!
//! Every function here is total over valid raw entries and pure apart from
//! the substitution warning emitted by [`Environment::resolve_str`].

use crate::document::{
    BackoffSettings, ProfileEntry, ProfileProviderEntry, ProfileProviderSource, ProfileSource,
    ProviderEntry, RetryPolicyEntry, RetryPolicyKind, RetryPolicySettings, SuperJsonDocument,
    UsecaseDefaultsMap,
};
use crate::env::Environment;
use crate::merge::merged_input;
use crate::normalized::{
    Backoff, DEFAULT_MAX_CONTIGUOUS_RETRIES, DEFAULT_REQUEST_TIMEOUT_MS,
    NormalizedProfileProviderSettings, NormalizedProfileSettings,
    NormalizedProviderSettings, NormalizedSuperJson, NormalizedUsecaseDefaults,
    NormalizedUsecaseDefaultsMap, RetryPolicy,
};
use serde_json::Value;
use superface_domain::{SemanticVersion, strip_file_uri};
use superface_shared::{ErrorCode, ErrorEnvelope};

/// A string entry matches neither the version nor the file-URI convention.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// Invalid profile entry.
    #[error("invalid profile entry format: \"{value}\"")]
    InvalidProfileEntry {
        /// Offending value.
        value: String,
    },
    /// Invalid profile-provider entry.
    #[error("invalid profile provider entry format: \"{value}\"")]
    InvalidProfileProviderEntry {
        /// Offending value.
        value: String,
    },
    /// Invalid provider entry.
    #[error("invalid provider entry format: \"{value}\"")]
    InvalidProviderEntry {
        /// Offending value.
        value: String,
    },
}

impl NormalizeError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidProfileEntry { .. } => ErrorCode::new("superjson", "invalid_profile_entry"),
            Self::InvalidProfileProviderEntry { .. } => {
                ErrorCode::new("superjson", "invalid_profile_provider_entry")
            },
            Self::InvalidProviderEntry { .. } => {
                ErrorCode::new("superjson", "invalid_provider_entry")
            },
        }
    }
}

impl From<NormalizeError> for ErrorEnvelope {
    fn from(error: NormalizeError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            NormalizeError::InvalidProfileEntry { value }
            | NormalizeError::InvalidProfileProviderEntry { value }
            | NormalizeError::InvalidProviderEntry { value } => envelope.with_metadata("value", value),
        }
    }
}

/// Normalize the whole document.
pub fn normalize_super_json(
    document: &SuperJsonDocument,
    environment: &Environment,
) -> Result<NormalizedSuperJson, NormalizeError> {
    let profiles = document
        .profiles
        .iter()
        .map(|(id, entry)| Ok((id.clone(), normalize_profile_settings(entry, environment)?)))
        .collect::<Result<_, NormalizeError>>()?;
    let providers = document
        .providers
        .iter()
        .map(|(name, entry)| Ok((name.clone(), normalize_provider_settings(entry, environment)?)))
        .collect::<Result<_, NormalizeError>>()?;

    Ok(NormalizedSuperJson {
        profiles,
        providers,
    })
}

/// Classify a profile shorthand string.
pub fn classify_profile_shorthand(value: &str) -> Result<ProfileSource, NormalizeError> {
    if let Some(path) = strip_file_uri(value) {
        return Ok(ProfileSource::File(path.to_owned()));
    }
    if SemanticVersion::is_full_version(value) {
        return Ok(ProfileSource::Version(value.to_owned()));
    }
    Err(NormalizeError::InvalidProfileEntry {
        value: value.to_owned(),
    })
}

/// Normalize one profile entry.
pub fn normalize_profile_settings(
    entry: &ProfileEntry,
    environment: &Environment,
) -> Result<NormalizedProfileSettings, NormalizeError> {
    let settings = match entry {
        ProfileEntry::Shorthand(value) => {
            return Ok(NormalizedProfileSettings {
                source: classify_profile_shorthand(value)?,
                defaults: NormalizedUsecaseDefaultsMap::new(),
                priority: Vec::new(),
                providers: indexmap::IndexMap::new(),
            });
        },
        ProfileEntry::Full(settings) => settings,
    };

    if let ProfileSource::Version(version) = &settings.source
        && SemanticVersion::parse(version).is_err()
    {
        return Err(NormalizeError::InvalidProfileEntry {
            value: version.clone(),
        });
    }

    let defaults = normalize_usecase_defaults(settings.defaults.as_ref(), None, environment);

    let mut providers = indexmap::IndexMap::new();
    for (name, provider) in settings.providers.iter().flatten() {
        providers.insert(
            name.clone(),
            normalize_profile_provider_settings(Some(provider), &defaults, environment)?,
        );
    }

    let priority = settings
        .priority
        .clone()
        .unwrap_or_else(|| providers.keys().cloned().collect());

    Ok(NormalizedProfileSettings {
        source: settings.source.clone(),
        defaults,
        priority,
        providers,
    })
}

/// Normalize one profile-provider entry over the profile-level defaults.
///
/// `None` is an entry that only appears in the priority list.
pub fn normalize_profile_provider_settings(
    entry: Option<&ProfileProviderEntry>,
    base_defaults: &NormalizedUsecaseDefaultsMap,
    environment: &Environment,
) -> Result<NormalizedProfileProviderSettings, NormalizeError> {
    let (source, defaults) = match entry {
        None => (ProfileProviderSource::remote(), None),
        Some(ProfileProviderEntry::Shorthand(value)) => {
            let Some(path) = strip_file_uri(value) else {
                return Err(NormalizeError::InvalidProfileProviderEntry {
                    value: value.clone(),
                });
            };
            (
                ProfileProviderSource::File {
                    file: path.to_owned(),
                },
                None,
            )
        },
        Some(ProfileProviderEntry::Full(settings)) => {
            (settings.source.clone(), settings.defaults.as_ref())
        },
    };

    Ok(NormalizedProfileProviderSettings {
        source,
        defaults: normalize_usecase_defaults(defaults, Some(base_defaults), environment),
    })
}

/// Normalize use-case defaults over an optional normalized base.
///
/// The result holds the union of use cases from `base` and `entry`; inputs
/// deep-merge with `entry` winning, and string leaves of `entry` go through
/// environment substitution before the merge.
pub fn normalize_usecase_defaults(
    entry: Option<&UsecaseDefaultsMap>,
    base: Option<&NormalizedUsecaseDefaultsMap>,
    environment: &Environment,
) -> NormalizedUsecaseDefaultsMap {
    let mut normalized = base.cloned().unwrap_or_default();

    for (usecase, defaults) in entry.into_iter().flatten() {
        let previous = normalized.get(usecase);

        let resolved_input = defaults.input.as_ref().map(|input| {
            match environment.resolve_value(Value::Object(input.clone())) {
                Value::Object(map) => map,
                _ => serde_json::Map::new(),
            }
        });
        let input = merged_input(
            previous.map(|previous| &previous.input),
            resolved_input.as_ref(),
        );

        let merged = NormalizedUsecaseDefaults {
            input,
            provider_failover: defaults
                .provider_failover
                .or_else(|| previous.map(|previous| previous.provider_failover))
                .unwrap_or(false),
            retry_policy: normalize_retry_policy(
                defaults.retry_policy.as_ref(),
                previous.map(|previous| &previous.retry_policy),
            ),
        };
        normalized.insert(usecase.clone(), merged);
    }

    normalized
}

/// Expand a raw retry policy over an optional normalized base.
#[must_use]
pub fn normalize_retry_policy(
    entry: Option<&RetryPolicyEntry>,
    base: Option<&RetryPolicy>,
) -> RetryPolicy {
    let Some(entry) = entry else {
        return base.cloned().unwrap_or_default();
    };

    let settings = match entry {
        RetryPolicyEntry::Kind(RetryPolicyKind::None)
        | RetryPolicyEntry::Full(RetryPolicySettings {
            kind: RetryPolicyKind::None,
            ..
        }) => return RetryPolicy::None,
        RetryPolicyEntry::Kind(RetryPolicyKind::CircuitBreaker) => None,
        RetryPolicyEntry::Full(settings) => Some(settings),
    };

    let (base_retries, base_timeout, base_backoff) = match base {
        Some(RetryPolicy::CircuitBreaker {
            max_contiguous_retries,
            request_timeout,
            backoff,
        }) => (*max_contiguous_retries, *request_timeout, backoff.clone()),
        _ => (
            DEFAULT_MAX_CONTIGUOUS_RETRIES,
            DEFAULT_REQUEST_TIMEOUT_MS,
            Backoff::default_exponential(),
        ),
    };

    RetryPolicy::CircuitBreaker {
        max_contiguous_retries: settings
            .and_then(|settings| settings.max_contiguous_retries)
            .unwrap_or(base_retries),
        request_timeout: settings
            .and_then(|settings| settings.request_timeout)
            .unwrap_or(base_timeout),
        backoff: normalize_backoff(
            settings.and_then(|settings| settings.backoff.as_ref()),
            &base_backoff,
        ),
    }
}

fn normalize_backoff(entry: Option<&BackoffSettings>, base: &Backoff) -> Backoff {
    let Backoff::Exponential {
        start: base_start,
        factor: base_factor,
    } = base;
    match entry {
        None => base.clone(),
        Some(settings) => Backoff::Exponential {
            start: settings.start.unwrap_or(*base_start),
            factor: settings.factor.unwrap_or(*base_factor),
        },
    }
}

/// Normalize one provider entry.
pub fn normalize_provider_settings(
    entry: &ProviderEntry,
    environment: &Environment,
) -> Result<NormalizedProviderSettings, NormalizeError> {
    match entry {
        ProviderEntry::Shorthand(value) => {
            let Some(path) = strip_file_uri(value) else {
                return Err(NormalizeError::InvalidProviderEntry {
                    value: value.clone(),
                });
            };
            Ok(NormalizedProviderSettings {
                file: Some(path.to_owned()),
                security: Vec::new(),
                parameters: indexmap::IndexMap::new(),
            })
        },
        ProviderEntry::Full(settings) => Ok(NormalizedProviderSettings {
            file: settings.file.clone(),
            security: settings
                .security
                .iter()
                .flatten()
                .map(|values| {
                    values
                        .clone()
                        .map_fields(|field| environment.resolve_str(&field))
                })
                .collect(),
            parameters: settings
                .parameters
                .iter()
                .flatten()
                .map(|(name, value)| (name.clone(), environment.resolve_str(value)))
                .collect(),
        }),
    }
}
