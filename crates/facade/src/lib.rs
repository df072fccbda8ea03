//! # superface-facade
//!
//! Client API for consumers of the SDK, plus the inspection helpers the
//! CLI uses. This crate depends on `infra` and `app`.
//!
//! ```text
//! SuperfaceClient ─ get_profile ─► Profile ─ get_usecase ─► UseCase::perform
//!                 └ get_provider / get_provider_for_profile ─► Provider
//! ```

pub mod cache;
pub mod client;
pub mod profile;
pub mod provider;

pub use cache::DocumentCache;
pub use client::SuperfaceClient;
pub use profile::{PerformOptions, Profile, ProfileConfiguration, UseCase};
pub use provider::Provider;

pub use superface_app::{BindConfiguration, BoundProfileProvider, PerformError, ProviderConfiguration};
pub use superface_config::{Environment, SdkConfig, SecurityValues};
pub use superface_infra::{
    AnonymizedSummary, InfraError, LoggerChoice, SdkConfigSummary, anonymized_summary,
    detect_document, load_document, load_sdk_config, normalized_document, sdk_config_summary,
};

/// Returns the facade crate version.
#[must_use]
pub const fn facade_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
