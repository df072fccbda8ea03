//! # superface-domain
//!
//! Domain primitives and external artifact models for the superface SDK.
//!
//! - **Primitives** - `ProfileId`, `ProviderName`, `UsecaseName`
//! - **Versions** - `SemanticVersion`
//! - **File URIs** - the `file://` setting convention
//! - **Providers** - `ProviderJson`, services, parameters
//! - **Security** - declared `SecurityScheme`s and resolved `SecurityConfiguration`s
//! - **ASTs** - opaque `ProfileAst` / `MapAst` with header access
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No infrastructure or adapter dependencies
//! - Pure domain logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use superface_shared::shared_crate_version;

pub mod ast;
pub mod file_uri;
pub mod primitives;
pub mod provider;
pub mod security;
pub mod version;

pub use ast::{AstError, MapAst, ProfileAst, ProfileHeader};
pub use file_uri::{FILE_URI_PREFIX, is_file_uri, strip_file_uri, to_file_uri};
pub use primitives::{
    PrimitiveError, ProfileId, ProviderName, UsecaseName, is_valid_document_name,
};
pub use provider::{ProviderInfo, ProviderJson, ProviderParameter, ProviderService};
pub use security::{
    ApiKeyBodyType, ApiKeyPlacement, SecurityConfiguration, SecurityKind, SecurityScheme,
};
pub use version::SemanticVersion;

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
