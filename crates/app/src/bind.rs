//! Resolution and binding pipeline.
//!
//! Turns a profile and provider into a [`BoundProfileProvider`]. Every
//! artifact is resolved locally first (inline value, `file://` reference,
//! or a document lookup) and fetched from the registry otherwise.

use crate::bound::{BoundProfileProvider, duration_ms};
use crate::deps::SdkDeps;
use crate::resolve_value::{Setting, Unpacked, ValueResolver, parse_json_file};
use crate::security::{resolve_security_configuration, resolve_security_values};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use superface_config::{
    NormalizedSuperJson, NormalizedUsecaseDefaultsMap, ProfileProviderSource,
    ProfileSource, SecurityValues, SuperJson, compiled_ast_path, grid_profile_ast_path,
};
use superface_domain::{MapAst, ProfileAst, ProviderJson, strip_file_uri, to_file_uri};
use superface_ports::{BindRequest, LogFields};
use superface_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};

/// Provider selection supplied by the caller.
///
/// `security`, when set, replaces the document's values as the base of
/// security resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfiguration {
    /// Provider name.
    pub name: String,
    /// Explicit security values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityValues>>,
    /// Parameters overriding the document's.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

impl ProviderConfiguration {
    /// Configuration that defers everything to the document.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Stable key identifying this configuration.
    pub fn cache_key(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Per-bind options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BindConfiguration {
    /// Service to use instead of the provider's default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    /// Security values merged over the base values by id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityValues>>,
    /// Parameters with the highest precedence.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

impl BindConfiguration {
    /// Stable key identifying these options.
    pub fn cache_key(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A profile and provider waiting to be bound.
pub struct ProfileProvider {
    deps: SdkDeps,
    super_json: Arc<SuperJson>,
    profile: Setting<ProfileAst>,
    provider: ProviderConfiguration,
    provider_descriptor: Option<ProviderJson>,
    map: Option<Setting<MapAst>>,
}

impl ProfileProvider {
    /// Pair `profile` (an AST, a profile id or a `file://` reference) with a provider.
    #[must_use]
    pub const fn new(
        deps: SdkDeps,
        super_json: Arc<SuperJson>,
        profile: Setting<ProfileAst>,
        provider: ProviderConfiguration,
    ) -> Self {
        Self {
            deps,
            super_json,
            profile,
            provider,
            provider_descriptor: None,
            map: None,
        }
    }

    /// Use an already-loaded provider descriptor.
    #[must_use]
    pub fn with_provider_descriptor(mut self, descriptor: ProviderJson) -> Self {
        self.provider_descriptor = Some(descriptor);
        self
    }

    /// Use a map AST or `file://` reference instead of the document's map.
    #[must_use]
    pub fn with_map(mut self, map: Setting<MapAst>) -> Self {
        self.map = Some(map);
        self
    }

    /// Resolve every artifact and produce a bound provider.
    pub async fn bind(
        &self,
        ctx: &RequestContext,
        configuration: &BindConfiguration,
    ) -> Result<BoundProfileProvider> {
        let started_at = Instant::now();
        let mut fields = LogFields::from([
            (
                "correlationId".into(),
                Value::from(ctx.correlation_id().as_str()),
            ),
            ("provider".into(), Value::from(self.provider.name.as_str())),
        ]);
        self.deps
            .log_info("sdk.bind.start", "Bind started", fields.clone());

        let result = self.run_bind(ctx, configuration).await;

        fields.insert("durationMs".into(), Value::from(duration_ms(started_at)));
        match &result {
            Ok(bound) => {
                fields.insert("profile".into(), Value::from(bound.profile_ast.header().id()));
                fields.insert("serviceId".into(), Value::from(bound.service_id.as_str()));
                self.deps
                    .log_info("sdk.bind.completed", "Bind completed", fields);
            },
            Err(error) => {
                fields.insert("errorCode".into(), Value::from(error.code.to_string()));
                self.deps.log_error("sdk.bind.failed", "Bind failed", fields);
            },
        }
        result
    }

    async fn run_bind(
        &self,
        ctx: &RequestContext,
        configuration: &BindConfiguration,
    ) -> Result<BoundProfileProvider> {
        let normalized = self.super_json.normalized()?;
        let resolver = ValueResolver::new(self.deps.filesystem.as_ref(), self.super_json.directory());
        let provider_name = self.provider.name.as_str();

        let profile_ast = self.resolve_profile(ctx, &resolver, &normalized).await?;
        let header = profile_ast.header();
        let profile_id = header.id();

        let mut provider_json = self.resolve_provider(ctx, &resolver, &normalized).await?;

        let profile_settings = normalized.profiles.get(&profile_id);
        let map_source = profile_settings
            .and_then(|settings| settings.providers.get(provider_name))
            .map(|settings| &settings.source);
        let local_map = self
            .resolve_map(ctx, &resolver, &profile_id, map_source)
            .await?;

        let map_ast = match local_map {
            Some(map_ast) => {
                if provider_json.is_none() {
                    return Err(ErrorEnvelope::expected(
                        ErrorCode::new("bind", "not_implemented"),
                        format!(
                            "map for provider \"{provider_name}\" is local but the provider descriptor is not"
                        ),
                    )
                    .with_metadata("profile", profile_id.clone())
                    .with_metadata("provider", provider_name));
                }
                map_ast
            },
            None => {
                if let Some(ProfileProviderSource::File { file }) = map_source {
                    return Err(ErrorEnvelope::expected(
                        ErrorCode::new("bind", "map_not_found"),
                        format!("map file \"{file}\" could not be read"),
                    )
                    .with_metadata("profile", profile_id.clone())
                    .with_metadata("provider", provider_name));
                }
                let (map_variant, map_revision) = match map_source {
                    Some(ProfileProviderSource::Remote {
                        map_variant,
                        map_revision,
                    }) => (map_variant.clone(), map_revision.clone()),
                    _ => (None, None),
                };
                let request = BindRequest {
                    profile_id: format!("{profile_id}@{}", header.version),
                    provider: provider_name.to_owned(),
                    map_variant,
                    map_revision,
                };
                self.deps.log_debug(
                    "sdk.registry.fetch_bind",
                    "Fetching map from the registry",
                    LogFields::from([
                        ("profile".into(), Value::from(request.profile_id.as_str())),
                        ("provider".into(), Value::from(provider_name)),
                    ]),
                );
                let response = self.deps.registry.fetch_bind(ctx, request).await?;
                if provider_json.is_none() {
                    provider_json = Some(response.provider);
                }
                response.map_ast
            },
        };

        let provider = provider_json.ok_or_else(|| {
            ErrorEnvelope::expected(
                ErrorCode::new("superjson", "provider_not_found"),
                format!("provider \"{provider_name}\" could not be resolved"),
            )
        })?;

        let service_id = configuration
            .service_id
            .clone()
            .unwrap_or_else(|| provider.default_service.clone());
        let base_url = provider
            .service(&service_id)
            .map(|service| service.base_url.clone())
            .ok_or_else(|| {
                ErrorEnvelope::expected(
                    ErrorCode::new("bind", "service_not_found"),
                    format!("service \"{service_id}\" is not declared by provider \"{provider_name}\""),
                )
                .with_metadata("service_id", service_id.clone())
                .with_metadata("provider", provider_name)
            })?;

        let values = resolve_security_values(
            &normalized,
            provider_name,
            self.provider.security.as_deref(),
            configuration.security.as_deref(),
        );
        let security =
            resolve_security_configuration(provider_name, &provider.security_schemes, &values)?;

        let defaults = usecase_defaults(&normalized, &profile_id, provider_name);
        let parameters = self.parameters(&normalized, &provider, configuration);

        Ok(BoundProfileProvider {
            profile_ast,
            map_ast,
            provider,
            service_id,
            base_url,
            defaults,
            security,
            parameters,
            deps: self.deps.clone(),
        })
    }

    async fn resolve_profile(
        &self,
        ctx: &RequestContext,
        resolver: &ValueResolver<'_>,
        normalized: &NormalizedSuperJson,
    ) -> Result<ProfileAst> {
        let local = resolver
            .resolve(
                ctx,
                Some(self.profile.clone()),
                |text, path| parse_json_file(text, path, ProfileAst::from_value),
                |key| match normalized.profiles.get(key).map(|settings| &settings.source) {
                    Some(ProfileSource::File(path)) => Unpacked::Reference(to_file_uri(
                        &compiled_ast_path(Path::new(local_path(path))).to_string_lossy(),
                    )),
                    Some(ProfileSource::Version(version)) => Unpacked::Reference(to_file_uri(
                        &grid_profile_ast_path(key, version).to_string_lossy(),
                    )),
                    None => Unpacked::Missing,
                },
            )
            .await?;
        if let Some(profile_ast) = local {
            return Ok(profile_ast);
        }

        let invalid = |reference: &str| {
            ErrorEnvelope::expected(
                ErrorCode::new("bind", "invalid_profile"),
                format!("Invalid profile \"{reference}\""),
            )
            .with_metadata("profile", reference)
        };
        let Setting::Reference(reference) = &self.profile else {
            return Err(invalid("<inline>"));
        };
        let Some(ProfileSource::Version(version)) = normalized
            .profiles
            .get(reference)
            .map(|settings| &settings.source)
        else {
            return Err(invalid(reference));
        };

        match self
            .deps
            .registry
            .fetch_profile_ast(ctx, format!("{reference}@{version}"))
            .await
        {
            Ok(profile_ast) => Ok(profile_ast),
            Err(error) if error.code == ErrorCode::not_found() => Err(invalid(reference)),
            Err(error) => Err(error),
        }
    }

    async fn resolve_provider(
        &self,
        ctx: &RequestContext,
        resolver: &ValueResolver<'_>,
        normalized: &NormalizedSuperJson,
    ) -> Result<Option<ProviderJson>> {
        let input = match &self.provider_descriptor {
            Some(descriptor) => Setting::Artifact(descriptor.clone()),
            None => Setting::Reference(self.provider.name.clone()),
        };
        resolver
            .resolve(
                ctx,
                Some(input),
                |text, path| parse_json_file(text, path, serde_json::from_value::<ProviderJson>),
                |key| {
                    match normalized
                        .providers
                        .get(key)
                        .and_then(|settings| settings.file.as_deref())
                    {
                        Some(file) => Unpacked::Reference(to_file_uri(local_path(file))),
                        None => Unpacked::Missing,
                    }
                },
            )
            .await
    }

    async fn resolve_map(
        &self,
        ctx: &RequestContext,
        resolver: &ValueResolver<'_>,
        profile_id: &str,
        source: Option<&ProfileProviderSource>,
    ) -> Result<Option<MapAst>> {
        let compound_key = format!("{profile_id}.{}", self.provider.name);
        let input = self
            .map
            .clone()
            .unwrap_or_else(|| Setting::Reference(compound_key.clone()));
        resolver
            .resolve(
                ctx,
                Some(input),
                |text, path| parse_json_file(text, path, MapAst::from_value),
                |key| match source {
                    Some(ProfileProviderSource::File { file }) if key == compound_key => {
                        Unpacked::Reference(to_file_uri(
                            &compiled_ast_path(Path::new(local_path(file))).to_string_lossy(),
                        ))
                    },
                    _ => Unpacked::Missing,
                },
            )
            .await
    }

    /// Declared defaults < document < provider configuration < bind options.
    fn parameters(
        &self,
        normalized: &NormalizedSuperJson,
        provider: &ProviderJson,
        configuration: &BindConfiguration,
    ) -> BTreeMap<String, String> {
        let mut parameters: BTreeMap<String, String> = provider
            .parameters
            .iter()
            .filter_map(|parameter| {
                parameter
                    .default
                    .as_ref()
                    .map(|default| (parameter.name.clone(), default.clone()))
            })
            .collect();
        if let Some(settings) = normalized.providers.get(&self.provider.name) {
            parameters.extend(
                settings
                    .parameters
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone())),
            );
        }
        parameters.extend(self.provider.parameters.clone());
        parameters.extend(configuration.parameters.clone());
        parameters
    }
}

/// Profile-provider defaults, or the profile's own when the pairing is not declared.
fn usecase_defaults(
    normalized: &NormalizedSuperJson,
    profile_id: &str,
    provider: &str,
) -> NormalizedUsecaseDefaultsMap {
    normalized
        .profiles
        .get(profile_id)
        .map(|profile| {
            profile
                .providers
                .get(provider)
                .map_or_else(|| profile.defaults.clone(), |settings| settings.defaults.clone())
        })
        .unwrap_or_default()
}

fn local_path(path: &str) -> &str {
    strip_file_uri(path).unwrap_or(path)
}
