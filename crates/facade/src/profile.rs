//! Profile and use-case handles.

use crate::client::SuperfaceClient;
use crate::provider::Provider;
use serde::Serialize;
use serde_json::{Map, Value};
use superface_app::{BindConfiguration, PerformError};
use superface_shared::{RequestContext, Result};

/// Profile identity as declared in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileConfiguration {
    /// Profile id (`scope/name`).
    pub id: String,
    /// Declared version; `None` for file-backed profiles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ProfileConfiguration {
    /// Stable key identifying this profile.
    pub fn cache_key(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A profile obtained from [`SuperfaceClient::get_profile`].
#[derive(Debug, Clone)]
pub struct Profile {
    client: SuperfaceClient,
    configuration: ProfileConfiguration,
}

impl Profile {
    pub(crate) const fn new(client: SuperfaceClient, configuration: ProfileConfiguration) -> Self {
        Self {
            client,
            configuration,
        }
    }

    /// Profile identity.
    #[must_use]
    pub const fn configuration(&self) -> &ProfileConfiguration {
        &self.configuration
    }

    /// Handle for one use case.
    #[must_use]
    pub fn get_usecase(&self, name: impl Into<String>) -> UseCase {
        UseCase {
            profile: self.clone(),
            name: name.into(),
        }
    }
}

/// Per-call options of [`UseCase::perform`].
#[derive(Debug, Clone, Default)]
pub struct PerformOptions {
    /// Provider to use instead of the profile's first priority.
    pub provider: Option<Provider>,
    /// Service, security and parameter overrides for the bind.
    pub bind: BindConfiguration,
}

/// A use case of a profile.
#[derive(Debug, Clone)]
pub struct UseCase {
    profile: Profile,
    name: String,
}

impl UseCase {
    /// Use-case name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind (or reuse a bound provider) and run the use case.
    #[tracing::instrument(level = "debug", skip_all, fields(usecase = %self.name))]
    pub async fn perform(
        &self,
        ctx: &RequestContext,
        input: Map<String, Value>,
        options: PerformOptions,
    ) -> Result<std::result::Result<Value, PerformError>> {
        let client = &self.profile.client;
        let profile = &self.profile.configuration;
        let provider = match options.provider {
            Some(provider) => provider,
            None => client.get_provider_for_profile(ctx, &profile.id).await?,
        };
        let bound = client
            .bound_provider(ctx, profile, &provider, &options.bind)
            .await?;
        bound.perform(ctx, &self.name, input).await
    }
}
