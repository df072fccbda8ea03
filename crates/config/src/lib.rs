//! # superface-config
//!
//! Configuration document (`super.json`) model, normalization, mutation and
//! telemetry projection, plus the SDK environment layer.
//! This crate depends on `domain` and `shared` only.

/// Telemetry projection and configuration hash.
pub mod anonymize;
/// Raw document model.
pub mod document;
/// Environment snapshot, substitution and SDK env parsing.
pub mod env;
/// Synchronous loading and serialization helpers.
pub mod load;
/// Merge primitives.
pub mod merge;
/// Mutation engine.
pub mod mutate;
/// Normalization engine.
pub mod normalize;
/// Normalized document model.
pub mod normalized;
/// Loaded document wrapper.
pub mod super_json;

pub use anonymize::{
    AnonymizedProfile, AnonymizedProfileProvider, AnonymizedSuperJson, FILE_VERSION, anonymize,
};
pub use document::{
    BackoffKind, BackoffSettings, ProfileEntry, ProfileProviderEntry, ProfileProviderSettings,
    ProfileProviderSource, ProfileSettings, ProfileSource, ProviderEntry, ProviderSettings,
    RetryPolicyEntry, RetryPolicyKind, RetryPolicySettings, SecurityValues, SuperJsonDocument,
    UsecaseDefaults, UsecaseDefaultsMap,
};
pub use env::{
    DEFAULT_API_URL, DEFAULT_SUPER_JSON_PATH, ENV_API_URL, ENV_SDK_TOKEN, ENV_SUPERFACE_PATH,
    EnvParseError, Environment, SdkConfig, SdkEnv,
};
pub use load::{
    AST_SUFFIX, GRID_DIR, SUPER_JSON_FILE, SUPERFACE_DIR, compiled_ast_path, grid_profile_ast_path,
    load_super_json_from_path, to_pretty_json,
};
pub use merge::{deep_merge, merge_security, merge_usecase_defaults, merged_input};
pub use mutate::{MutationError, ProfileProviderVariant, ProviderVariant};
pub use normalize::{
    NormalizeError, classify_profile_shorthand, normalize_profile_provider_settings,
    normalize_profile_settings, normalize_provider_settings, normalize_retry_policy,
    normalize_super_json, normalize_usecase_defaults,
};
pub use normalized::{
    Backoff, DEFAULT_BACKOFF_FACTOR, DEFAULT_BACKOFF_START_MS, DEFAULT_MAX_CONTIGUOUS_RETRIES,
    DEFAULT_REQUEST_TIMEOUT_MS, NormalizedProfileProviderSettings, NormalizedProfileSettings,
    NormalizedProviderSettings, NormalizedSuperJson, NormalizedUsecaseDefaults,
    NormalizedUsecaseDefaultsMap, RetryPolicy,
};
pub use super_json::SuperJson;

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
