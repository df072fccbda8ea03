//! Semantic versions as used by profiles and the registry.
//!
//! Accepted shapes: `MAJOR`, `MAJOR.MINOR`, `MAJOR.MINOR.PATCH`, each with an
//! optional `-label` suffix. The configuration document only accepts the
//! full three-part form (see [`SemanticVersion::is_full_version`]); partial
//! forms appear in registry metadata.

use crate::PrimitiveError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parsed semantic version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SemanticVersion {
    /// Major component.
    pub major: u64,
    /// Minor component, absent for `MAJOR`-only versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor: Option<u64>,
    /// Patch component, absent for partial versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<u64>,
    /// Optional pre-release label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SemanticVersion {
    /// Parse a version string.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        let invalid = || PrimitiveError::InvalidVersion {
            input: raw.to_owned(),
        };

        let (numbers, label) = match raw.split_once('-') {
            Some((numbers, label)) => (numbers, Some(label)),
            None => (raw, None),
        };
        if let Some(label) = label
            && (label.is_empty()
                || !label
                    .chars()
                    .all(|ch| ch.is_ascii_alphanumeric() || ch == '.' || ch == '-'))
        {
            return Err(invalid());
        }

        let mut parts = numbers.split('.');
        let major = parts.next().and_then(parse_component).ok_or_else(invalid)?;
        let minor = parts.next().map(|part| parse_component(part).ok_or_else(invalid)).transpose()?;
        let patch = parts.next().map(|part| parse_component(part).ok_or_else(invalid)).transpose()?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self {
            major,
            minor,
            patch,
            label: label.map(str::to_owned),
        })
    }

    /// Returns true when `input` is a full `MAJOR.MINOR.PATCH[-label]` version.
    #[must_use]
    pub fn is_full_version(input: &str) -> bool {
        Self::parse(input).is_ok_and(|version| version.patch.is_some())
    }
}

fn parse_component(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.major)?;
        if let Some(minor) = self.minor {
            write!(formatter, ".{minor}")?;
        }
        if let Some(patch) = self.patch {
            write!(formatter, ".{patch}")?;
        }
        if let Some(label) = &self.label {
            write!(formatter, "-{label}")?;
        }
        Ok(())
    }
}
