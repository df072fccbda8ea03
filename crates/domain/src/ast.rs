//! Opaque profile and map ASTs.
//!
//! Both ASTs are authored and interpreted elsewhere; this layer only checks the
//! document kind and reads the header fields it needs for binding and caching.

use crate::SemanticVersion;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use superface_shared::{ErrorCode, ErrorEnvelope};

/// An AST document failed the structural header checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstError {
    /// Expected document kind.
    pub expected_kind: &'static str,
    /// What was wrong.
    pub reason: String,
}

impl fmt::Display for AstError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "invalid {}: {}", self.expected_kind, self.reason)
    }
}

impl std::error::Error for AstError {}

impl From<AstError> for ErrorEnvelope {
    fn from(error: AstError) -> Self {
        Self::expected(ErrorCode::new("domain", "invalid_ast"), error.to_string())
            .with_metadata("expected_kind", error.expected_kind)
    }
}

/// Header of a profile AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileHeader {
    /// Optional scope.
    pub scope: Option<String>,
    /// Profile name.
    pub name: String,
    /// Profile version.
    pub version: SemanticVersion,
}

impl ProfileHeader {
    /// `scope/name` or `name`.
    #[must_use]
    pub fn id(&self) -> String {
        match &self.scope {
            Some(scope) => format!("{scope}/{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Profile AST (`ProfileDocument`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct ProfileAst {
    header: ProfileHeader,
    document: Value,
}

impl ProfileAst {
    /// Kind tag of profile documents.
    pub const KIND: &'static str = "ProfileDocument";

    /// Check the document kind and read the header.
    pub fn from_value(document: Value) -> Result<Self, AstError> {
        let fail = |reason: &str| AstError {
            expected_kind: Self::KIND,
            reason: reason.to_owned(),
        };
        check_kind(&document, Self::KIND).map_err(|reason| fail(&reason))?;

        let header = document.get("header").ok_or_else(|| fail("missing header"))?;
        let name = header
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| fail("missing header.name"))?;
        let version = header
            .get("version")
            .ok_or_else(|| fail("missing header.version"))
            .and_then(|version| parse_version_node(version).map_err(|reason| fail(&reason)))?;

        Ok(Self {
            header: ProfileHeader {
                scope: header.get("scope").and_then(Value::as_str).map(str::to_owned),
                name: name.to_owned(),
                version,
            },
            document,
        })
    }

    /// Parsed header.
    #[must_use]
    pub const fn header(&self) -> &ProfileHeader {
        &self.header
    }

    /// Use cases defined by the profile.
    pub fn usecase_names(&self) -> impl Iterator<Item = &str> {
        definitions(&self.document)
            .filter(|definition| {
                definition.get("kind").and_then(Value::as_str) == Some("UseCaseDefinition")
            })
            .filter_map(|definition| definition.get("useCaseName").and_then(Value::as_str))
    }

    /// Raw document.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.document
    }
}

impl TryFrom<Value> for ProfileAst {
    type Error = AstError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<ProfileAst> for Value {
    fn from(ast: ProfileAst) -> Self {
        ast.document
    }
}

/// Map AST (`MapDocument`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct MapAst {
    provider: String,
    variant: Option<String>,
    document: Value,
}

impl MapAst {
    /// Kind tag of map documents.
    pub const KIND: &'static str = "MapDocument";

    /// Check the document kind and read the header.
    pub fn from_value(document: Value) -> Result<Self, AstError> {
        let fail = |reason: &str| AstError {
            expected_kind: Self::KIND,
            reason: reason.to_owned(),
        };
        check_kind(&document, Self::KIND).map_err(|reason| fail(&reason))?;

        let header = document.get("header").ok_or_else(|| fail("missing header"))?;
        let provider = header
            .get("provider")
            .and_then(Value::as_str)
            .ok_or_else(|| fail("missing header.provider"))?
            .to_owned();
        let variant = header.get("variant").and_then(Value::as_str).map(str::to_owned);

        Ok(Self {
            provider,
            variant,
            document,
        })
    }

    /// Provider the map was written for.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Map variant, if any.
    #[must_use]
    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    /// Raw document.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.document
    }
}

impl TryFrom<Value> for MapAst {
    type Error = AstError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<MapAst> for Value {
    fn from(ast: MapAst) -> Self {
        ast.document
    }
}

fn check_kind(document: &Value, expected: &str) -> Result<(), String> {
    match document.get("kind").and_then(Value::as_str) {
        Some(kind) if kind == expected => Ok(()),
        Some(kind) => Err(format!("unexpected kind \"{kind}\"")),
        None => Err("missing kind".to_owned()),
    }
}

fn definitions(document: &Value) -> impl Iterator<Item = &Value> {
    document
        .get("definitions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
}

/// Versions appear either as strings or as `{ major, minor, patch, label? }` nodes.
fn parse_version_node(node: &Value) -> Result<SemanticVersion, String> {
    if let Some(raw) = node.as_str() {
        return SemanticVersion::parse(raw).map_err(|error| error.to_string());
    }
    let component = |key: &str| node.get(key).and_then(Value::as_u64);
    let major = component("major").ok_or_else(|| "missing version.major".to_owned())?;
    Ok(SemanticVersion {
        major,
        minor: component("minor"),
        patch: component("patch"),
        label: node.get("label").and_then(Value::as_str).map(str::to_owned),
    })
}
