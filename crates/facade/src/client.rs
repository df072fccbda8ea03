//! Client façade over the binding pipeline.

use crate::cache::{BoundProviderCache, DocumentCache};
use crate::profile::{Profile, ProfileConfiguration};
use crate::provider::Provider;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use superface_app::{
    BindConfiguration, BoundProfileProvider, ProfileProvider, ProviderConfiguration, SdkDeps,
    Setting,
};
use superface_config::{Environment, ProfileSource, SdkConfig, SuperJson};
use superface_domain::ProviderInfo;
use superface_infra::{LoggerChoice, build_sdk_deps};
use superface_ports::{LogFields, MapInterpreterPort, ParameterValidatorPort};
use superface_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};

/// Entry point of the SDK.
///
/// Cloning is cheap; clones share the bound provider cache.
#[derive(Debug, Clone)]
pub struct SuperfaceClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    deps: SdkDeps,
    super_json_path: PathBuf,
    environment: Environment,
    documents: Arc<DocumentCache>,
    bound: BoundProviderCache,
}

impl SuperfaceClient {
    /// Client over explicit dependencies.
    #[must_use]
    pub fn new(
        deps: SdkDeps,
        super_json_path: impl Into<PathBuf>,
        environment: Environment,
        documents: Arc<DocumentCache>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                deps,
                super_json_path: super_json_path.into(),
                environment,
                documents,
                bound: BoundProviderCache::new(),
            }),
        }
    }

    /// Client wired from `config` with local disk access and the HTTP registry.
    pub fn from_config(
        config: &SdkConfig,
        interpreter: Arc<dyn MapInterpreterPort>,
        validator: Arc<dyn ParameterValidatorPort>,
        logger: LoggerChoice,
        documents: Arc<DocumentCache>,
    ) -> Result<Self> {
        let deps = build_sdk_deps(config, interpreter, validator, logger)?;
        Ok(Self::new(
            deps,
            config.super_json_path.clone(),
            Environment::from_std_env(),
            documents,
        ))
    }

    /// Path of the configuration document.
    #[must_use]
    pub fn super_json_path(&self) -> &Path {
        &self.inner.super_json_path
    }

    /// The configuration document, loaded through the shared cache.
    pub async fn super_json(&self, ctx: &RequestContext) -> Result<Arc<SuperJson>> {
        self.inner
            .documents
            .load(
                ctx,
                self.inner.deps.filesystem.as_ref(),
                &self.inner.super_json_path,
                &self.inner.environment,
            )
            .await
    }

    /// Handle for a profile declared in the document.
    #[tracing::instrument(level = "debug", skip_all, fields(profile = profile_id))]
    pub async fn get_profile(&self, ctx: &RequestContext, profile_id: &str) -> Result<Profile> {
        let super_json = self.super_json(ctx).await?;
        let normalized = super_json.normalized()?;
        let settings = normalized
            .profiles
            .get(profile_id)
            .ok_or_else(|| profile_not_found(profile_id))?;
        let version = match &settings.source {
            ProfileSource::Version(version) => Some(version.clone()),
            ProfileSource::File(_) => None,
        };
        Ok(Profile::new(
            self.clone(),
            ProfileConfiguration {
                id: profile_id.to_owned(),
                version,
            },
        ))
    }

    /// Handle for a provider declared in the document.
    pub async fn get_provider(&self, ctx: &RequestContext, name: &str) -> Result<Provider> {
        let super_json = self.super_json(ctx).await?;
        let normalized = super_json.normalized()?;
        let settings = normalized.providers.get(name).ok_or_else(|| {
            ErrorEnvelope::expected(
                ErrorCode::new("superjson", "provider_not_found"),
                format!("provider \"{name}\" is not declared in super.json"),
            )
            .with_metadata("provider", name)
        })?;
        Ok(Provider::new(
            ProviderConfiguration::new(name),
            settings.security.clone(),
        ))
    }

    /// The first provider in the profile's priority list.
    ///
    /// `providerFailover` defaults do not influence the choice.
    pub async fn get_provider_for_profile(
        &self,
        ctx: &RequestContext,
        profile_id: &str,
    ) -> Result<Provider> {
        let super_json = self.super_json(ctx).await?;
        let normalized = super_json.normalized()?;
        let settings = normalized
            .profiles
            .get(profile_id)
            .ok_or_else(|| profile_not_found(profile_id))?;
        let Some(first) = settings.priority.first() else {
            return Err(ErrorEnvelope::expected(
                ErrorCode::new("client", "no_provider_for_profile"),
                format!("no provider is configured for profile \"{profile_id}\""),
            )
            .with_metadata("profile", profile_id));
        };
        self.get_provider(ctx, first).await
    }

    /// Providers the registry lists for a profile.
    pub async fn registry_providers(
        &self,
        ctx: &RequestContext,
        profile_id: &str,
    ) -> Result<Vec<ProviderInfo>> {
        self.inner
            .deps
            .registry
            .fetch_providers(ctx, profile_id.to_owned())
            .await
    }

    /// Bind `profile` to `provider`, at most once per configuration.
    pub async fn bound_provider(
        &self,
        ctx: &RequestContext,
        profile: &ProfileConfiguration,
        provider: &Provider,
        bind: &BindConfiguration,
    ) -> Result<Arc<BoundProfileProvider>> {
        let key = format!(
            "{}|{}|{}",
            profile.cache_key()?,
            provider.cache_key()?,
            bind.cache_key()?
        );
        self.inner
            .bound
            .get_or_try_init(key, || async {
                if let Some(logger) = self.inner.deps.logger.as_ref() {
                    logger.debug(
                        "sdk.client.bind",
                        "Binding profile provider",
                        Some(LogFields::from([
                            ("profile".into(), Value::from(profile.id.as_str())),
                            ("provider".into(), Value::from(provider.name())),
                        ])),
                    );
                }
                let super_json = self.super_json(ctx).await?;
                ProfileProvider::new(
                    self.inner.deps.clone(),
                    super_json,
                    Setting::Reference(profile.id.clone()),
                    provider.configuration().clone(),
                )
                .bind(ctx, bind)
                .await
            })
            .await
    }

    /// Number of settled bound providers.
    pub async fn bound_provider_count(&self) -> usize {
        self.inner.bound.len().await
    }
}

fn profile_not_found(profile_id: &str) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        ErrorCode::new("superjson", "profile_not_found"),
        format!("profile \"{profile_id}\" is not declared in super.json"),
    )
    .with_metadata("profile", profile_id)
}
