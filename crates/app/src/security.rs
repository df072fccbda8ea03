//! Matching of configured credentials against provider-declared schemes.

use superface_config::{NormalizedSuperJson, SecurityValues, merge_security};
use superface_domain::{SecurityConfiguration, SecurityKind, SecurityScheme};
use superface_shared::{ErrorCode, ErrorEnvelope, SecretString};

/// Credentials that cannot be matched to the provider's schemes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecurityError {
    /// No scheme declares the value's id.
    #[error("could not find security scheme \"{id}\" for provider \"{provider}\"")]
    SchemeNotFound {
        /// Id of the security value.
        id: String,
        /// Provider the schemes belong to.
        provider: String,
    },
    /// The value's fields do not fit the scheme's type.
    #[error("security values for \"{id}\" do not match the {expected} scheme")]
    ValuesMismatch {
        /// Scheme id.
        id: String,
        /// Declared scheme type.
        expected: SecurityKind,
    },
}

impl From<SecurityError> for ErrorEnvelope {
    fn from(error: SecurityError) -> Self {
        let message = error.to_string();
        match error {
            SecurityError::SchemeNotFound { id, provider } => {
                Self::expected(ErrorCode::new("security", "scheme_not_found"), message)
                    .with_metadata("scheme_id", id)
                    .with_metadata("provider", provider)
            },
            SecurityError::ValuesMismatch { id, expected } => {
                Self::expected(ErrorCode::new("security", "values_mismatch"), message)
                    .with_metadata("scheme_id", id)
                    .with_metadata("expected", expected.as_str())
            },
        }
    }
}

/// Effective security values for a provider.
///
/// `explicit` replaces the document's values as the base; `overlay` is then
/// merged on top by id.
#[must_use]
pub fn resolve_security_values(
    normalized: &NormalizedSuperJson,
    provider: &str,
    explicit: Option<&[SecurityValues]>,
    overlay: Option<&[SecurityValues]>,
) -> Vec<SecurityValues> {
    let base = explicit.map_or_else(
        || {
            normalized
                .providers
                .get(provider)
                .map(|settings| settings.security.clone())
                .unwrap_or_default()
        },
        <[SecurityValues]>::to_vec,
    );
    match overlay {
        Some(overlay) => merge_security(&base, overlay),
        None => base,
    }
}

/// Combine each value with its scheme; output follows the order of `values`.
pub fn resolve_security_configuration(
    provider: &str,
    schemes: &[SecurityScheme],
    values: &[SecurityValues],
) -> Result<Vec<SecurityConfiguration>, SecurityError> {
    values
        .iter()
        .map(|value| {
            let scheme = schemes
                .iter()
                .find(|scheme| scheme.id() == value.id())
                .ok_or_else(|| SecurityError::SchemeNotFound {
                    id: value.id().to_owned(),
                    provider: provider.to_owned(),
                })?;
            configure(scheme, value)
        })
        .collect()
}

fn configure(
    scheme: &SecurityScheme,
    value: &SecurityValues,
) -> Result<SecurityConfiguration, SecurityError> {
    let configuration = match (scheme, value) {
        (
            SecurityScheme::ApiKey {
                id,
                placement,
                name,
                body_type,
            },
            SecurityValues::ApiKey { apikey, .. },
        ) => SecurityConfiguration::ApiKey {
            id: id.clone(),
            placement: *placement,
            name: name.clone(),
            body_type: *body_type,
            apikey: SecretString::new(apikey.as_str()),
        },
        (
            SecurityScheme::Basic { id },
            SecurityValues::Credentials {
                username, password, ..
            },
        ) => SecurityConfiguration::Basic {
            id: id.clone(),
            username: username.clone(),
            password: SecretString::new(password.as_str()),
        },
        (SecurityScheme::Bearer { id, bearer_format }, SecurityValues::Bearer { token, .. }) => {
            SecurityConfiguration::Bearer {
                id: id.clone(),
                bearer_format: bearer_format.clone(),
                token: SecretString::new(token.as_str()),
            }
        },
        (
            SecurityScheme::Digest {
                id,
                status_code,
                challenge_header,
                authorization_header,
            },
            SecurityValues::Credentials {
                username, password, ..
            },
        ) => SecurityConfiguration::Digest {
            id: id.clone(),
            status_code: *status_code,
            challenge_header: challenge_header.clone(),
            authorization_header: authorization_header.clone(),
            username: username.clone(),
            password: SecretString::new(password.as_str()),
        },
        (scheme, _) => {
            return Err(SecurityError::ValuesMismatch {
                id: scheme.id().to_owned(),
                expected: scheme.kind(),
            });
        },
    };
    Ok(configuration)
}
