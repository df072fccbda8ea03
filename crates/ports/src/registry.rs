//! Registry boundary contract.

use crate::BoxFuture;
use serde::{Deserialize, Serialize};
use superface_domain::{MapAst, ProfileAst, ProviderInfo, ProviderJson};
use superface_shared::{RequestContext, Result};

/// Fetch-and-bind request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BindRequest {
    /// Profile id qualified with its version (`scope/name@1.2.3`).
    pub profile_id: String,
    /// Provider name.
    pub provider: String,
    /// Pinned map variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_variant: Option<String>,
    /// Pinned map revision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_revision: Option<String>,
}

/// Fetch-and-bind response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindResponse {
    /// Provider descriptor.
    pub provider: ProviderJson,
    /// Map AST bound to the profile and provider.
    pub map_ast: MapAst,
}

/// Boundary contract for the artifact registry.
pub trait RegistryPort: Send + Sync {
    /// Resolve the map (and provider descriptor) for a profile/provider pair.
    fn fetch_bind(&self, ctx: &RequestContext, request: BindRequest) -> BoxFuture<'_, Result<BindResponse>>;

    /// List providers implementing a profile.
    fn fetch_providers(
        &self,
        ctx: &RequestContext,
        profile_id: String,
    ) -> BoxFuture<'_, Result<Vec<ProviderInfo>>>;

    /// Fetch a compiled profile AST by versioned id (`scope/name@1.2.3`).
    fn fetch_profile_ast(
        &self,
        ctx: &RequestContext,
        profile_id: String,
    ) -> BoxFuture<'_, Result<ProfileAst>>;
}
