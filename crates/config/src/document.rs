//! Raw configuration document (`super.json`) model.
//!
//! Every union in the on-disk schema is a sum type here. Shorthand strings are
//! kept verbatim (classification happens at normalization time); full records
//! are validated on deserialization through private wire structs so that the
//! exclusivity rules (`version` xor `file`, `file` xor `mapVariant`/`mapRevision`,
//! exactly one credential shape) hold for every value of these types.

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Use-case defaults keyed by use-case name.
pub type UsecaseDefaultsMap = IndexMap<String, UsecaseDefaults>;

/// Root of the configuration document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SuperJsonDocument {
    /// Profiles keyed by profile id, in insertion order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub profiles: IndexMap<String, ProfileEntry>,
    /// Providers keyed by provider name, in insertion order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub providers: IndexMap<String, ProviderEntry>,
}

// =============================================================================
// PROFILES
// =============================================================================

/// A profile entry: shorthand string (version or `file://` URI) or full record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProfileEntry {
    /// Bare semantic version or `file://` URI.
    Shorthand(String),
    /// Full record.
    Full(ProfileSettings),
}

impl<'de> Deserialize<'de> for ProfileEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(shorthand) => Ok(Self::Shorthand(shorthand)),
            value @ Value::Object(_) => ProfileSettings::deserialize(value)
                .map(Self::Full)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "profile entry must be a string or an object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

/// Where a profile definition comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProfileSource {
    /// Registry version (`MAJOR.MINOR.PATCH[-label]`).
    Version(String),
    /// Local file path, relative to the document directory.
    File(String),
}

/// Full profile record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProfileSettingsWire", into = "ProfileSettingsWire")]
pub struct ProfileSettings {
    /// Version or file source.
    pub source: ProfileSource,
    /// Profile-level use-case defaults.
    pub defaults: Option<UsecaseDefaultsMap>,
    /// Explicit provider priority.
    pub priority: Option<Vec<String>>,
    /// Profile-provider entries.
    pub providers: Option<IndexMap<String, ProfileProviderEntry>>,
}

impl ProfileSettings {
    /// Record with only a source.
    #[must_use]
    pub const fn from_source(source: ProfileSource) -> Self {
        Self {
            source,
            defaults: None,
            priority: None,
            providers: None,
        }
    }

    /// True when a shorthand can replace this record without losing data.
    #[must_use]
    pub fn has_no_siblings(&self) -> bool {
        self.defaults.as_ref().is_none_or(IndexMap::is_empty)
            && self.providers.as_ref().is_none_or(IndexMap::is_empty)
            && self.priority.as_ref().is_none_or(Vec::is_empty)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ProfileSettingsWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    defaults: Option<UsecaseDefaultsMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    priority: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    providers: Option<IndexMap<String, ProfileProviderEntry>>,
}

impl TryFrom<ProfileSettingsWire> for ProfileSettings {
    type Error = String;

    fn try_from(wire: ProfileSettingsWire) -> Result<Self, Self::Error> {
        let source = match (wire.version, wire.file) {
            (Some(version), None) => ProfileSource::Version(version),
            (None, Some(file)) => ProfileSource::File(file),
            (Some(_), Some(_)) => {
                return Err("profile settings must not set both \"version\" and \"file\"".to_owned());
            },
            (None, None) => {
                return Err("profile settings must set either \"version\" or \"file\"".to_owned());
            },
        };
        Ok(Self {
            source,
            defaults: wire.defaults,
            priority: wire.priority,
            providers: wire.providers,
        })
    }
}

impl From<ProfileSettings> for ProfileSettingsWire {
    fn from(settings: ProfileSettings) -> Self {
        let (version, file) = match settings.source {
            ProfileSource::Version(version) => (Some(version), None),
            ProfileSource::File(file) => (None, Some(file)),
        };
        Self {
            version,
            file,
            defaults: settings.defaults,
            priority: settings.priority,
            providers: settings.providers,
        }
    }
}

// =============================================================================
// PROFILE PROVIDERS
// =============================================================================

/// A profile-provider entry: shorthand `file://` URI or full record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProfileProviderEntry {
    /// Bare `file://` URI pointing at a map.
    Shorthand(String),
    /// Full record.
    Full(ProfileProviderSettings),
}

impl<'de> Deserialize<'de> for ProfileProviderEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(shorthand) => Ok(Self::Shorthand(shorthand)),
            value @ Value::Object(_) => ProfileProviderSettings::deserialize(value)
                .map(Self::Full)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "profile provider entry must be a string or an object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

/// Where a map comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProfileProviderSource {
    /// Local map file.
    File {
        /// Path relative to the document directory.
        file: String,
    },
    /// Registry map, optionally pinned.
    #[serde(rename_all = "camelCase")]
    Remote {
        /// Map variant.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        map_variant: Option<String>,
        /// Map revision.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        map_revision: Option<String>,
    },
}

impl ProfileProviderSource {
    /// Remote source with no pinning.
    #[must_use]
    pub const fn remote() -> Self {
        Self::Remote {
            map_variant: None,
            map_revision: None,
        }
    }

    /// True for an unpinned remote source.
    #[must_use]
    pub const fn is_unpinned_remote(&self) -> bool {
        matches!(
            self,
            Self::Remote {
                map_variant: None,
                map_revision: None
            }
        )
    }
}

/// Full profile-provider record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProfileProviderSettingsWire", into = "ProfileProviderSettingsWire")]
pub struct ProfileProviderSettings {
    /// Map source.
    pub source: ProfileProviderSource,
    /// Profile-provider-level use-case defaults.
    pub defaults: Option<UsecaseDefaultsMap>,
}

impl ProfileProviderSettings {
    /// True when a shorthand can replace this record without losing data.
    #[must_use]
    pub fn has_no_siblings(&self) -> bool {
        self.defaults.as_ref().is_none_or(IndexMap::is_empty)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ProfileProviderSettingsWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    map_variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    map_revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    defaults: Option<UsecaseDefaultsMap>,
}

impl TryFrom<ProfileProviderSettingsWire> for ProfileProviderSettings {
    type Error = String;

    fn try_from(wire: ProfileProviderSettingsWire) -> Result<Self, Self::Error> {
        let source = match wire.file {
            Some(_) if wire.map_variant.is_some() || wire.map_revision.is_some() => {
                return Err(
                    "profile provider settings must not combine \"file\" with \"mapVariant\"/\"mapRevision\""
                        .to_owned(),
                );
            },
            Some(file) => ProfileProviderSource::File { file },
            None => ProfileProviderSource::Remote {
                map_variant: wire.map_variant,
                map_revision: wire.map_revision,
            },
        };
        Ok(Self {
            source,
            defaults: wire.defaults,
        })
    }
}

impl From<ProfileProviderSettings> for ProfileProviderSettingsWire {
    fn from(settings: ProfileProviderSettings) -> Self {
        let (file, map_variant, map_revision) = match settings.source {
            ProfileProviderSource::File { file } => (Some(file), None, None),
            ProfileProviderSource::Remote {
                map_variant,
                map_revision,
            } => (None, map_variant, map_revision),
        };
        Self {
            file,
            map_variant,
            map_revision,
            defaults: settings.defaults,
        }
    }
}

// =============================================================================
// USECASE DEFAULTS
// =============================================================================

/// Defaults for one use case.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UsecaseDefaults {
    /// Default input record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Map<String, Value>>,
    /// Provider failover flag. Carried through; does not affect selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_failover: Option<bool>,
    /// Retry policy handed to the interpreter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicyEntry>,
}

/// Retry policy kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetryPolicyKind {
    /// No retries.
    #[serde(rename = "none")]
    None,
    /// Circuit breaker.
    #[serde(rename = "circuit-breaker")]
    CircuitBreaker,
}

/// Raw retry policy: a bare kind or an explicit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RetryPolicyEntry {
    /// `"none"` / `"circuit-breaker"`
    Kind(RetryPolicyKind),
    /// Explicit record with optional parameters.
    Full(RetryPolicySettings),
}

/// Explicit retry policy record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RetryPolicySettings {
    /// Policy kind.
    pub kind: RetryPolicyKind,
    /// Contiguous retries before the breaker opens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_contiguous_retries: Option<u32>,
    /// Per-request timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Backoff between attempts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff: Option<BackoffSettings>,
}

/// Explicit backoff record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BackoffSettings {
    /// Backoff kind; only `exponential` exists.
    pub kind: BackoffKind,
    /// Initial delay in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,
    /// Growth factor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,
}

/// Backoff kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackoffKind {
    /// Exponential backoff.
    Exponential,
}

// =============================================================================
// PROVIDERS
// =============================================================================

/// A provider entry: shorthand `file://` URI or full record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProviderEntry {
    /// Bare `file://` URI pointing at a provider descriptor.
    Shorthand(String),
    /// Full record.
    Full(ProviderSettings),
}

impl<'de> Deserialize<'de> for ProviderEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(shorthand) => Ok(Self::Shorthand(shorthand)),
            value @ Value::Object(_) => ProviderSettings::deserialize(value)
                .map(Self::Full)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "provider entry must be a string or an object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

/// Full provider record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProviderSettings {
    /// Local provider descriptor path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Credentials, matched to provider schemes by id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityValues>>,
    /// Integration parameter values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<IndexMap<String, String>>,
}

impl ProviderSettings {
    /// True when a shorthand can replace this record without losing data.
    #[must_use]
    pub fn has_no_siblings(&self) -> bool {
        self.security.as_ref().is_none_or(Vec::is_empty)
            && self.parameters.as_ref().is_none_or(IndexMap::is_empty)
    }
}

// =============================================================================
// SECURITY VALUES
// =============================================================================

/// Credential data for one provider security scheme.
///
/// Basic and digest schemes share the `username`/`password` shape; which one
/// applies is decided by the scheme the id matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SecurityValuesWire", into = "SecurityValuesWire")]
pub enum SecurityValues {
    /// API key.
    ApiKey {
        /// Scheme id.
        id: String,
        /// Key value (may be a `$ENV` reference).
        apikey: String,
    },
    /// Basic or digest credentials.
    Credentials {
        /// Scheme id.
        id: String,
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
    /// Bearer token.
    Bearer {
        /// Scheme id.
        id: String,
        /// Token.
        token: String,
    },
}

impl SecurityValues {
    /// Scheme id the values are for.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::ApiKey { id, .. } | Self::Credentials { id, .. } | Self::Bearer { id, .. } => id,
        }
    }

    /// Apply `op` to every credential field (not the id).
    #[must_use]
    pub fn map_fields(self, mut op: impl FnMut(String) -> String) -> Self {
        match self {
            Self::ApiKey { id, apikey } => Self::ApiKey {
                id,
                apikey: op(apikey),
            },
            Self::Credentials {
                id,
                username,
                password,
            } => Self::Credentials {
                id,
                username: op(username),
                password: op(password),
            },
            Self::Bearer { id, token } => Self::Bearer {
                id,
                token: op(token),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SecurityValuesWire {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    apikey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

impl TryFrom<SecurityValuesWire> for SecurityValues {
    type Error = String;

    fn try_from(wire: SecurityValuesWire) -> Result<Self, Self::Error> {
        match wire {
            SecurityValuesWire {
                id,
                apikey: Some(apikey),
                username: None,
                password: None,
                token: None,
            } => Ok(Self::ApiKey { id, apikey }),
            SecurityValuesWire {
                id,
                apikey: None,
                username: Some(username),
                password: Some(password),
                token: None,
            } => Ok(Self::Credentials {
                id,
                username,
                password,
            }),
            SecurityValuesWire {
                id,
                apikey: None,
                username: None,
                password: None,
                token: Some(token),
            } => Ok(Self::Bearer { id, token }),
            SecurityValuesWire { id, .. } => Err(format!(
                "security values \"{id}\" must contain exactly one of: apikey, username+password, token"
            )),
        }
    }
}

impl From<SecurityValues> for SecurityValuesWire {
    fn from(values: SecurityValues) -> Self {
        let mut wire = Self {
            id: String::new(),
            apikey: None,
            username: None,
            password: None,
            token: None,
        };
        match values {
            SecurityValues::ApiKey { id, apikey } => {
                wire.id = id;
                wire.apikey = Some(apikey);
            },
            SecurityValues::Credentials {
                id,
                username,
                password,
            } => {
                wire.id = id;
                wire.username = Some(username);
                wire.password = Some(password);
            },
            SecurityValues::Bearer { id, token } => {
                wire.id = id;
                wire.token = Some(token);
            },
        }
        wire
    }
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
