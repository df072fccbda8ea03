//! HTTP registry adapter.

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use superface_config::SdkConfig;
use superface_domain::{MapAst, ProviderJson};
use superface_ports::{
    BindRequest, BindResponse, BoxFuture, ProfileAst, ProviderInfo, RegistryPort,
};
use superface_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result, SecretString};
use url::Url;

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const PROFILE_MEDIA_TYPE: &str = "application/vnd.superface.profile+json";
const TOKEN_SCHEME: &str = "SUPERFACE-SDK-TOKEN";

/// HTTP registry configuration.
#[derive(Debug, Clone)]
pub struct HttpRegistryConfig {
    /// Registry base URL.
    pub registry_url: String,
    /// Optional SDK token.
    pub sdk_token: Option<SecretString>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl HttpRegistryConfig {
    /// Build from the environment-derived SDK configuration.
    #[must_use]
    pub fn from_sdk_config(config: &SdkConfig) -> Self {
        Self {
            registry_url: config.registry_url.clone(),
            sdk_token: config.sdk_token.clone(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Registry client speaking the Superface registry HTTP API.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    client: reqwest::Client,
    base_url: Box<str>,
}

impl HttpRegistry {
    /// Create a registry client.
    pub fn new(config: &HttpRegistryConfig) -> Result<Self> {
        let base_url = config.registry_url.trim().trim_end_matches('/');
        if Url::parse(base_url).is_err() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "registry url must be an absolute URL",
            )
            .with_metadata("url", base_url));
        }
        if config.timeout_ms == 0 {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "timeout must be greater than zero",
            ));
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.sdk_token {
            let mut auth_header =
                HeaderValue::from_str(&format!("{TOKEN_SCHEME} {}", token.expose())).map_err(
                    |_| {
                        ErrorEnvelope::expected(
                            ErrorCode::invalid_input(),
                            "sdk token contains invalid header characters",
                        )
                    },
                )?;
            auth_header.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_header);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|error| {
                ErrorEnvelope::unexpected(
                    ErrorCode::new("registry", "client_init_failed"),
                    format!("failed to build registry client: {error}"),
                    ErrorClass::NonRetriable,
                )
            })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Registry base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut url = Url::parse(&raw).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                format!("invalid registry url: {error}"),
            )
            .with_metadata("url", raw.clone())
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder, url: &Url) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|error| map_reqwest_error(&error).with_metadata("url", url.as_str()))?;
        let status = response.status();
        let payload = response
            .bytes()
            .await
            .map_err(|error| map_reqwest_error(&error).with_metadata("url", url.as_str()))?;

        if !status.is_success() {
            return Err(map_registry_http_error(status, &payload).with_metadata("url", url.as_str()));
        }

        serde_json::from_slice(&payload).map_err(|error| {
            invalid_response(format!("failed to decode registry response: {error}"))
                .with_metadata("url", url.as_str())
        })
    }

    async fn bind(&self, request: BindRequest) -> Result<BindResponse> {
        let url = self.url("registry/bind", &[])?;
        tracing::debug!(
            profile = %request.profile_id,
            provider = %request.provider,
            "registry bind request"
        );
        let wire: BindWire = self
            .send(self.client.post(url.clone()).json(&request), &url)
            .await?;
        let map_ast = parse_map_ast(wire.map_ast).map_err(|error| error.with_metadata("url", url.as_str()))?;
        Ok(BindResponse {
            provider: wire.provider,
            map_ast,
        })
    }

    async fn providers(&self, profile_id: String) -> Result<Vec<ProviderInfo>> {
        let url = self.url("providers", &[("profile", profile_id.as_str())])?;
        let listing: ProvidersWire = self.send(self.client.get(url.clone()), &url).await?;
        Ok(listing.data)
    }

    async fn profile_ast(&self, profile_id: String) -> Result<ProfileAst> {
        let url = self.url(&profile_id, &[])?;
        let document: Value = self
            .send(
                self.client
                    .get(url.clone())
                    .header(ACCEPT, PROFILE_MEDIA_TYPE),
                &url,
            )
            .await?;
        ProfileAst::from_value(document)
            .map_err(|error| ErrorEnvelope::from(error).with_metadata("url", url.as_str()))
    }
}

impl RegistryPort for HttpRegistry {
    fn fetch_bind(&self, _ctx: &RequestContext, request: BindRequest) -> BoxFuture<'_, Result<BindResponse>> {
        Box::pin(self.bind(request))
    }

    fn fetch_providers(
        &self,
        _ctx: &RequestContext,
        profile_id: String,
    ) -> BoxFuture<'_, Result<Vec<ProviderInfo>>> {
        Box::pin(self.providers(profile_id))
    }

    fn fetch_profile_ast(
        &self,
        _ctx: &RequestContext,
        profile_id: String,
    ) -> BoxFuture<'_, Result<ProfileAst>> {
        Box::pin(self.profile_ast(profile_id))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BindWire {
    provider: ProviderJson,
    #[serde(alias = "map_ast")]
    map_ast: Value,
}

#[derive(Debug, Deserialize)]
struct ProvidersWire {
    data: Vec<ProviderInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct ProblemWire {
    title: Option<String>,
    detail: Option<String>,
}

/// Map ASTs arrive either inline or as serialized JSON text.
fn parse_map_ast(raw: Value) -> Result<MapAst> {
    let document = match raw {
        Value::String(text) => serde_json::from_str(&text).map_err(|error| {
            invalid_response(format!("map AST is not valid JSON: {error}"))
        })?,
        other => other,
    };
    MapAst::from_value(document).map_err(|error| invalid_response(error.to_string()))
}

fn invalid_response(message: impl Into<String>) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::new("registry", "invalid_response"),
        message,
        ErrorClass::NonRetriable,
    )
}

fn map_reqwest_error(error: &reqwest::Error) -> ErrorEnvelope {
    if error.is_timeout() {
        return ErrorEnvelope::unexpected(
            ErrorCode::timeout(),
            "registry request timed out",
            ErrorClass::Retriable,
        );
    }
    if error.is_connect() {
        return ErrorEnvelope::unexpected(
            ErrorCode::io(),
            format!("registry connection failed: {error}"),
            ErrorClass::Retriable,
        );
    }
    ErrorEnvelope::unexpected(
        ErrorCode::new("registry", "request_failed"),
        format!("registry request failed: {error}"),
        ErrorClass::NonRetriable,
    )
}

fn map_registry_http_error(status: StatusCode, payload: &[u8]) -> ErrorEnvelope {
    let problem = serde_json::from_slice::<ProblemWire>(payload).unwrap_or_default();
    let message = problem
        .detail
        .or(problem.title)
        .unwrap_or_else(|| format!("registry responded with HTTP {}", status.as_u16()));

    let envelope = match status.as_u16() {
        404 => ErrorEnvelope::expected(ErrorCode::not_found(), message),
        401 | 403 => ErrorEnvelope::expected(ErrorCode::permission_denied(), message),
        429 => ErrorEnvelope::unexpected(
            ErrorCode::new("core", "rate_limited"),
            message,
            ErrorClass::Retriable,
        ),
        _ if status.is_server_error() => ErrorEnvelope::unexpected(
            ErrorCode::new("registry", "http_error"),
            message,
            ErrorClass::Retriable,
        ),
        _ => ErrorEnvelope::unexpected(
            ErrorCode::new("registry", "http_error"),
            message,
            ErrorClass::NonRetriable,
        ),
    };
    envelope.with_metadata("status", status.as_u16().to_string())
}
