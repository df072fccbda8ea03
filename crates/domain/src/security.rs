//! Provider-declared security schemes and resolved security configurations.

use serde::{Deserialize, Serialize};
use superface_shared::SecretString;
use std::fmt;

/// Where an API key is placed in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApiKeyPlacement {
    /// Request header.
    Header,
    /// Request body.
    Body,
    /// URL path segment.
    Path,
    /// Query parameter.
    Query,
}

/// Body encoding for API keys placed in the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApiKeyBodyType {
    /// JSON body.
    Json,
}

/// Shape names used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityKind {
    /// `apiKey`
    ApiKey,
    /// `http` + `basic`
    HttpBasic,
    /// `http` + `bearer`
    HttpBearer,
    /// `http` + `digest`
    HttpDigest,
}

impl SecurityKind {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApiKey => "apikey",
            Self::HttpBasic => "http-basic",
            Self::HttpBearer => "http-bearer",
            Self::HttpDigest => "http-digest",
        }
    }
}

impl fmt::Display for SecurityKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A credential shape declared by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SecuritySchemeWire", into = "SecuritySchemeWire")]
pub enum SecurityScheme {
    /// API key in a header, body, path or query parameter.
    ApiKey {
        /// Scheme id.
        id: String,
        /// Placement of the key.
        placement: ApiKeyPlacement,
        /// Header/parameter name.
        name: Option<String>,
        /// Body encoding when placed in the body.
        body_type: Option<ApiKeyBodyType>,
    },
    /// HTTP basic auth.
    Basic {
        /// Scheme id.
        id: String,
    },
    /// HTTP bearer token.
    Bearer {
        /// Scheme id.
        id: String,
        /// Informational token format, e.g. `JWT`.
        bearer_format: Option<String>,
    },
    /// HTTP digest auth.
    Digest {
        /// Scheme id.
        id: String,
        /// Status code that carries the challenge.
        status_code: Option<u16>,
        /// Response header carrying the challenge.
        challenge_header: Option<String>,
        /// Request header carrying the authorization.
        authorization_header: Option<String>,
    },
}

impl SecurityScheme {
    /// Scheme id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::ApiKey { id, .. }
            | Self::Basic { id }
            | Self::Bearer { id, .. }
            | Self::Digest { id, .. } => id,
        }
    }

    /// Shape kind.
    #[must_use]
    pub const fn kind(&self) -> SecurityKind {
        match self {
            Self::ApiKey { .. } => SecurityKind::ApiKey,
            Self::Basic { .. } => SecurityKind::HttpBasic,
            Self::Bearer { .. } => SecurityKind::HttpBearer,
            Self::Digest { .. } => SecurityKind::HttpDigest,
        }
    }
}

/// On-the-wire shape of a security scheme (`type` + `scheme` discriminants).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecuritySchemeWire {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scheme: Option<String>,
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    placement: Option<ApiKeyPlacement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body_type: Option<ApiKeyBodyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bearer_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    challenge_header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    authorization_header: Option<String>,
}

impl TryFrom<SecuritySchemeWire> for SecurityScheme {
    type Error = String;

    fn try_from(wire: SecuritySchemeWire) -> Result<Self, Self::Error> {
        let id = wire.id;
        match (wire.kind.as_str(), wire.scheme.as_deref()) {
            ("apiKey", _) => Ok(Self::ApiKey {
                placement: wire
                    .placement
                    .ok_or_else(|| format!("security scheme \"{id}\" is missing \"in\""))?,
                id,
                name: wire.name,
                body_type: wire.body_type,
            }),
            ("http", Some("basic")) => Ok(Self::Basic { id }),
            ("http", Some("bearer")) => Ok(Self::Bearer {
                id,
                bearer_format: wire.bearer_format,
            }),
            ("http", Some("digest")) => Ok(Self::Digest {
                id,
                status_code: wire.status_code,
                challenge_header: wire.challenge_header,
                authorization_header: wire.authorization_header,
            }),
            (kind, scheme) => Err(format!(
                "security scheme \"{id}\" has unsupported type \"{kind}\" (scheme {scheme:?})"
            )),
        }
    }
}

impl From<SecurityScheme> for SecuritySchemeWire {
    fn from(scheme: SecurityScheme) -> Self {
        let mut wire = Self {
            id: scheme.id().to_owned(),
            kind: "http".to_owned(),
            scheme: None,
            placement: None,
            name: None,
            body_type: None,
            bearer_format: None,
            status_code: None,
            challenge_header: None,
            authorization_header: None,
        };
        match scheme {
            SecurityScheme::ApiKey {
                placement,
                name,
                body_type,
                ..
            } => {
                "apiKey".clone_into(&mut wire.kind);
                wire.placement = Some(placement);
                wire.name = name;
                wire.body_type = body_type;
            },
            SecurityScheme::Basic { .. } => wire.scheme = Some("basic".to_owned()),
            SecurityScheme::Bearer { bearer_format, .. } => {
                wire.scheme = Some("bearer".to_owned());
                wire.bearer_format = bearer_format;
            },
            SecurityScheme::Digest {
                status_code,
                challenge_header,
                authorization_header,
                ..
            } => {
                wire.scheme = Some("digest".to_owned());
                wire.status_code = status_code;
                wire.challenge_header = challenge_header;
                wire.authorization_header = authorization_header;
            },
        }
        wire
    }
}

/// Scheme metadata merged with a matching credential, consumed by the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityConfiguration {
    /// API key credential.
    ApiKey {
        /// Scheme id.
        id: String,
        /// Placement of the key.
        placement: ApiKeyPlacement,
        /// Header/parameter name.
        name: Option<String>,
        /// Body encoding when placed in the body.
        body_type: Option<ApiKeyBodyType>,
        /// The key.
        apikey: SecretString,
    },
    /// HTTP basic credential.
    Basic {
        /// Scheme id.
        id: String,
        /// User name.
        username: String,
        /// Password.
        password: SecretString,
    },
    /// HTTP bearer credential.
    Bearer {
        /// Scheme id.
        id: String,
        /// Informational token format.
        bearer_format: Option<String>,
        /// The token.
        token: SecretString,
    },
    /// HTTP digest credential.
    Digest {
        /// Scheme id.
        id: String,
        /// Status code that carries the challenge.
        status_code: Option<u16>,
        /// Response header carrying the challenge.
        challenge_header: Option<String>,
        /// Request header carrying the authorization.
        authorization_header: Option<String>,
        /// User name.
        username: String,
        /// Password.
        password: SecretString,
    },
}

impl SecurityConfiguration {
    /// Scheme id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::ApiKey { id, .. }
            | Self::Basic { id, .. }
            | Self::Bearer { id, .. }
            | Self::Digest { id, .. } => id,
        }
    }

    /// Shape kind.
    #[must_use]
    pub const fn kind(&self) -> SecurityKind {
        match self {
            Self::ApiKey { .. } => SecurityKind::ApiKey,
            Self::Basic { .. } => SecurityKind::HttpBasic,
            Self::Bearer { .. } => SecurityKind::HttpBearer,
            Self::Digest { .. } => SecurityKind::HttpDigest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_every_declared_shape() -> Result<(), serde_json::Error> {
        let schemes: Vec<SecurityScheme> = serde_json::from_value(json!([
            { "id": "key", "type": "apiKey", "in": "header", "name": "X-API-Key" },
            { "id": "basic", "type": "http", "scheme": "basic" },
            { "id": "bearer", "type": "http", "scheme": "bearer", "bearerFormat": "JWT" },
            { "id": "digest", "type": "http", "scheme": "digest", "statusCode": 401 }
        ]))?;

        let kinds: Vec<_> = schemes.iter().map(SecurityScheme::kind).collect();
        assert_eq!(
            kinds,
            [
                SecurityKind::ApiKey,
                SecurityKind::HttpBasic,
                SecurityKind::HttpBearer,
                SecurityKind::HttpDigest
            ]
        );
        assert!(matches!(
            schemes.first(),
            Some(SecurityScheme::ApiKey { placement: ApiKeyPlacement::Header, name: Some(name), .. })
                if name == "X-API-Key"
        ));
        Ok(())
    }

    #[test]
    fn rejects_unknown_http_scheme() {
        let parsed = serde_json::from_value::<SecurityScheme>(
            json!({ "id": "x", "type": "http", "scheme": "negotiate" }),
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn serializes_back_to_wire_shape() -> Result<(), serde_json::Error> {
        let scheme = SecurityScheme::Bearer {
            id: "bearer".to_owned(),
            bearer_format: None,
        };
        assert_eq!(
            serde_json::to_value(&scheme)?,
            json!({ "id": "bearer", "type": "http", "scheme": "bearer" })
        );
        Ok(())
    }
}
