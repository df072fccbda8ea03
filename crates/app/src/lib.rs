//! # superface-app
//!
//! Binding pipeline and use-case execution for the superface SDK.
//! This crate depends on `ports`, `config`, `domain`, and `shared`.
//!
//! - [`ValueResolver`]: inline, `file://` or keyed settings to artifacts
//! - [`resolve_security_configuration`]: credentials matched to provider schemes
//! - [`ProfileProvider`]: profile + provider to [`BoundProfileProvider`]
//! - [`detect_super_json`] / [`load_super_json`]: locating and reading the document

pub mod bind;
pub mod bound;
pub mod deps;
pub mod detect;
pub mod load;
pub mod resolve_value;
pub mod security;

pub use bind::{BindConfiguration, ProfileProvider, ProviderConfiguration};
pub use bound::{BoundProfileProvider, PerformError};
pub use deps::SdkDeps;
pub use detect::{DETECT_LEVELS_DOWN, DETECT_LEVELS_UP, detect_super_json};
pub use load::load_super_json;
pub use resolve_value::{MAX_RESOLVE_DEPTH, Setting, Unpacked, ValueResolver, parse_json_file};
pub use security::{SecurityError, resolve_security_configuration, resolve_security_values};

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
