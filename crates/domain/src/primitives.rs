//! Domain primitives with validated constructors.

use crate::SemanticVersion;
use serde::{Deserialize, Serialize};
use superface_shared::{ErrorCode, ErrorEnvelope};
use std::fmt;

/// Validation failures for domain primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    /// Profile id is not `[scope/]name` with valid document names.
    InvalidProfileId {
        /// Trimmed input that failed validation.
        input: String,
    },
    /// Provider name violates the document-name pattern.
    InvalidProviderName {
        /// Trimmed input that failed validation.
        input: String,
    },
    /// Use-case name is empty after trimming.
    EmptyUsecaseName {
        /// Length of the raw input before trimming.
        input_length: usize,
    },
    /// Semantic version could not be parsed.
    InvalidVersion {
        /// Raw version input.
        input: String,
    },
}

impl PrimitiveError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidProfileId { .. } => ErrorCode::new("domain", "invalid_profile_id"),
            Self::InvalidProviderName { .. } => ErrorCode::new("domain", "invalid_provider_name"),
            Self::EmptyUsecaseName { .. } => ErrorCode::new("domain", "invalid_usecase_name"),
            Self::InvalidVersion { .. } => ErrorCode::new("domain", "invalid_version"),
        }
    }
}

impl fmt::Display for PrimitiveError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidProfileId { input } => {
                write!(formatter, "Invalid profile id: \"{input}\"")
            },
            Self::InvalidProviderName { input } => {
                write!(formatter, "Invalid provider name: \"{input}\"")
            },
            Self::EmptyUsecaseName { .. } => formatter.write_str("UsecaseName must be non-empty"),
            Self::InvalidVersion { input } => write!(formatter, "Invalid version: \"{input}\""),
        }
    }
}

impl std::error::Error for PrimitiveError {}

impl From<PrimitiveError> for ErrorEnvelope {
    fn from(error: PrimitiveError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            PrimitiveError::InvalidProfileId { input }
            | PrimitiveError::InvalidProviderName { input }
            | PrimitiveError::InvalidVersion { input } => envelope.with_metadata("input", input),
            PrimitiveError::EmptyUsecaseName { input_length } => {
                envelope.with_metadata("input_length", input_length.to_string())
            },
        }
    }
}

/// Profile identifier, `name` or `scope/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileId {
    scope: Option<Box<str>>,
    name: Box<str>,
}

impl ProfileId {
    /// Parse a profile id from user input.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let trimmed = input.as_ref().trim();
        let invalid = || PrimitiveError::InvalidProfileId {
            input: trimmed.to_owned(),
        };

        let (scope, name) = match trimmed.split_once('/') {
            Some((scope, name)) => (Some(scope), name),
            None => (None, trimmed),
        };
        if scope.is_some_and(|scope| !is_valid_document_name(scope))
            || !is_valid_document_name(name)
        {
            return Err(invalid());
        }

        Ok(Self {
            scope: scope.map(Box::from),
            name: Box::from(name),
        })
    }

    /// Optional scope segment.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Name segment.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id qualified with a version, as the registry expects (`scope/name@1.0.0`).
    #[must_use]
    pub fn with_version(&self, version: &SemanticVersion) -> String {
        format!("{self}@{version}")
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(formatter, "{scope}/{}", self.name),
            None => formatter.write_str(&self.name),
        }
    }
}

impl TryFrom<String> for ProfileId {
    type Error = PrimitiveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ProfileId> for String {
    fn from(value: ProfileId) -> Self {
        value.to_string()
    }
}

/// Provider name as used in the configuration document and registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderName(Box<str>);

impl ProviderName {
    /// Parse a provider name from user input.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let trimmed = input.as_ref().trim();
        if !is_valid_document_name(trimmed) {
            return Err(PrimitiveError::InvalidProviderName {
                input: trimmed.to_owned(),
            });
        }
        Ok(Self(Box::from(trimmed)))
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ProviderName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Use-case name declared by a profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsecaseName(Box<str>);

impl UsecaseName {
    /// Parse a use-case name from user input.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PrimitiveError::EmptyUsecaseName {
                input_length: raw.len(),
            });
        }
        Ok(Self(Box::from(trimmed)))
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for UsecaseName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UsecaseName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// `[a-z][a-z0-9_-]*`
pub fn is_valid_document_name(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_lowercase() {
        return false;
    }
    chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn profile_id_splits_scope_and_name() -> Result<(), PrimitiveError> {
        let scoped = ProfileId::parse("communication/send-email")?;
        assert_eq!(scoped.scope(), Some("communication"));
        assert_eq!(scoped.name(), "send-email");
        assert_eq!(scoped.to_string(), "communication/send-email");

        let bare = ProfileId::parse("starwars")?;
        assert_eq!(bare.scope(), None);
        assert_eq!(bare.to_string(), "starwars");
        Ok(())
    }

    #[test]
    fn profile_id_rejects_malformed_input() {
        for input in ["", "a/b/c", "/name", "scope/", "Upper", "1abc", "a b"] {
            assert!(
                matches!(
                    ProfileId::parse(input),
                    Err(PrimitiveError::InvalidProfileId { .. })
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn profile_id_qualifies_with_version() -> Result<(), PrimitiveError> {
        let id = ProfileId::parse("p")?;
        let version = SemanticVersion::parse("1.0.0")?;
        assert_eq!(id.with_version(&version), "p@1.0.0");
        Ok(())
    }

    #[test]
    fn usecase_name_requires_non_empty_input() {
        assert!(matches!(
            UsecaseName::parse("  "),
            Err(PrimitiveError::EmptyUsecaseName { input_length: 2 })
        ));
    }

    proptest! {
        #[test]
        fn provider_name_accepts_document_names(name in "[a-z][a-z0-9_-]{0,24}") {
            let parsed = ProviderName::parse(&name);
            prop_assert!(parsed.is_ok());
        }

        #[test]
        fn profile_id_display_round_trips(scope in "[a-z][a-z0-9-]{0,12}", name in "[a-z][a-z0-9_]{0,12}") {
            let raw = format!("{scope}/{name}");
            let parsed = ProfileId::parse(&raw);
            prop_assert_eq!(parsed.map(|id| id.to_string()).ok(), Some(raw));
        }
    }
}
