//! Loaded configuration document with its cached normalized projection.

use crate::anonymize::{AnonymizedSuperJson, anonymize};
use crate::document::{ProfileEntry, ProfileProviderEntry, ProviderEntry, SuperJsonDocument};
use crate::env::Environment;
use crate::load::{grid_profile_ast_path, to_pretty_json};
use crate::mutate::{MutationError, ProfileProviderVariant, ProviderVariant};
use crate::normalize::{NormalizeError, normalize_super_json};
use crate::normalized::NormalizedSuperJson;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use superface_domain::strip_file_uri;
use superface_shared::{ErrorCode, ErrorEnvelope, sha256_hex};

/// A configuration document bound to its location and environment.
///
/// The normalized view is computed lazily and dropped by every mutation that
/// reports a change.
#[derive(Debug, Clone)]
pub struct SuperJson {
    document: SuperJsonDocument,
    path: PathBuf,
    environment: Environment,
    normalized: OnceLock<Arc<NormalizedSuperJson>>,
}

impl SuperJson {
    /// Wrap an already-parsed document.
    #[must_use]
    pub fn new(document: SuperJsonDocument, path: impl Into<PathBuf>, environment: Environment) -> Self {
        Self {
            document,
            path: path.into(),
            environment,
            normalized: OnceLock::new(),
        }
    }

    /// Parse and schema-validate document text.
    pub fn parse(
        text: &str,
        path: impl Into<PathBuf>,
        environment: Environment,
    ) -> Result<Self, ErrorEnvelope> {
        let path = path.into();
        let value: serde_json::Value = serde_json::from_str(text).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("superjson", "invalid_json"),
                format!("invalid super.json: {error}"),
            )
            .with_metadata("path", path.to_string_lossy().to_string())
        })?;
        let document: SuperJsonDocument = serde_json::from_value(value).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("superjson", "invalid_entry"),
                format!("super.json does not match the schema: {error}"),
            )
            .with_metadata("path", path.to_string_lossy().to_string())
        })?;
        Ok(Self::new(document, path, environment))
    }

    /// Raw document.
    #[must_use]
    pub const fn document(&self) -> &SuperJsonDocument {
        &self.document
    }

    /// Path the document was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Environment used for `$NAME` substitution.
    #[must_use]
    pub const fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Directory containing the document.
    #[must_use]
    pub fn directory(&self) -> &Path {
        self.path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// Resolve a document-relative path (`file://` prefix optional).
    #[must_use]
    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        let relative = strip_file_uri(relative).unwrap_or(relative);
        self.directory().join(relative)
    }

    /// Location of a registry profile AST cached next to the document.
    #[must_use]
    pub fn grid_profile_ast_path(&self, profile_id: &str, version: &str) -> PathBuf {
        self.directory().join(grid_profile_ast_path(profile_id, version))
    }

    /// Normalized projection, computed once until the next change.
    pub fn normalized(&self) -> Result<Arc<NormalizedSuperJson>, NormalizeError> {
        if let Some(normalized) = self.normalized.get() {
            return Ok(Arc::clone(normalized));
        }
        let normalized = Arc::new(normalize_super_json(&self.document, &self.environment)?);
        Ok(Arc::clone(self.normalized.get_or_init(|| normalized)))
    }

    /// Raw document as pretty JSON with a trailing newline.
    pub fn stringified(&self) -> Result<String, ErrorEnvelope> {
        to_pretty_json(&self.document)
    }

    /// Telemetry projection of the normalized document.
    pub fn anonymized(&self) -> Result<AnonymizedSuperJson, NormalizeError> {
        let normalized = self.normalized()?;
        Ok(anonymize(&normalized))
    }

    /// Content hash of the canonical telemetry projection.
    pub fn config_hash(&self) -> Result<String, ErrorEnvelope> {
        let anonymized = self.anonymized()?;
        let canonical = serde_json::to_string(&anonymized)?;
        Ok(sha256_hex(canonical))
    }

    fn track(&mut self, changed: bool) -> bool {
        if changed {
            self.normalized = OnceLock::new();
        }
        changed
    }

    /// See [`SuperJsonDocument::add_profile`].
    pub fn add_profile(&mut self, profile: &str, payload: ProfileEntry) -> Result<bool, MutationError> {
        let changed = self.document.add_profile(profile, payload)?;
        Ok(self.track(changed))
    }

    /// See [`SuperJsonDocument::add_profile_provider`].
    pub fn add_profile_provider(
        &mut self,
        profile: &str,
        provider: &str,
        payload: ProfileProviderEntry,
    ) -> Result<bool, MutationError> {
        let changed = self.document.add_profile_provider(profile, provider, payload)?;
        Ok(self.track(changed))
    }

    /// See [`SuperJsonDocument::add_provider`].
    pub fn add_provider(&mut self, provider: &str, payload: ProviderEntry) -> Result<bool, MutationError> {
        let changed = self.document.add_provider(provider, payload)?;
        Ok(self.track(changed))
    }

    /// See [`SuperJsonDocument::set_priority`].
    pub fn set_priority(&mut self, profile: &str, order: &[String]) -> Result<bool, MutationError> {
        let changed = self.document.set_priority(profile, order)?;
        Ok(self.track(changed))
    }

    /// See [`SuperJsonDocument::set_profile`].
    pub fn set_profile(&mut self, profile: &str, entry: ProfileEntry) -> bool {
        let changed = self.document.set_profile(profile, entry);
        self.track(changed)
    }

    /// See [`SuperJsonDocument::set_profile_provider`].
    pub fn set_profile_provider(
        &mut self,
        profile: &str,
        provider: &str,
        entry: ProfileProviderEntry,
    ) -> Result<bool, MutationError> {
        let changed = self.document.set_profile_provider(profile, provider, entry)?;
        Ok(self.track(changed))
    }

    /// See [`SuperJsonDocument::set_provider`].
    pub fn set_provider(&mut self, provider: &str, entry: ProviderEntry) -> bool {
        let changed = self.document.set_provider(provider, entry);
        self.track(changed)
    }

    /// See [`SuperJsonDocument::unset_profile`].
    pub fn unset_profile(&mut self, profile: &str) -> bool {
        let changed = self.document.unset_profile(profile);
        self.track(changed)
    }

    /// See [`SuperJsonDocument::unset_profile_provider`].
    pub fn unset_profile_provider(&mut self, profile: &str, provider: &str) -> bool {
        let changed = self.document.unset_profile_provider(profile, provider);
        self.track(changed)
    }

    /// See [`SuperJsonDocument::unset_provider`].
    pub fn unset_provider(&mut self, provider: &str) -> bool {
        let changed = self.document.unset_provider(provider);
        self.track(changed)
    }

    /// See [`SuperJsonDocument::swap_profile_provider_variant`].
    pub fn swap_profile_provider_variant(
        &mut self,
        profile: &str,
        provider: &str,
        variant: ProfileProviderVariant,
    ) -> Result<bool, MutationError> {
        let changed = self
            .document
            .swap_profile_provider_variant(profile, provider, variant)?;
        Ok(self.track(changed))
    }

    /// See [`SuperJsonDocument::swap_provider_variant`].
    pub fn swap_provider_variant(
        &mut self,
        provider: &str,
        variant: ProviderVariant,
    ) -> Result<bool, MutationError> {
        let changed = self.document.swap_provider_variant(provider, variant)?;
        Ok(self.track(changed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ProviderSettings;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    const DOCUMENT: &str = r#"{
        "profiles": { "p": { "version": "1.0.0", "providers": { "first": {}, "second": {} } } },
        "providers": { "first": "file://first.json" }
    }"#;

    #[test]
    fn parse_separates_syntax_and_schema_errors() {
        let syntax = SuperJson::parse("{", "super.json", Environment::empty());
        assert_eq!(
            syntax.err().map(|error| error.code.to_string()).as_deref(),
            Some("superjson:invalid_json")
        );

        let schema = SuperJson::parse(r#"{ "profiles": { "p": 7 } }"#, "super.json", Environment::empty());
        assert_eq!(
            schema.err().map(|error| error.code.to_string()).as_deref(),
            Some("superjson:invalid_entry")
        );
    }

    #[test]
    fn mutation_invalidates_normalized_view() -> TestResult {
        let mut super_json = SuperJson::parse(DOCUMENT, "/app/superface/super.json", Environment::empty())?;
        let before = super_json.normalized()?;
        assert!(Arc::ptr_eq(&before, &super_json.normalized()?));

        super_json.add_provider("second", ProviderEntry::Full(ProviderSettings::default()))?;
        super_json.set_priority("p", &["second".to_owned(), "first".to_owned()])?;

        let after = super_json.normalized()?;
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(
            after.profiles.get("p").map(|profile| profile.priority.clone()),
            Some(vec!["second".to_owned(), "first".to_owned()])
        );
        assert!(!super_json.set_priority("p", &["second".to_owned(), "first".to_owned()])?);
        assert!(Arc::ptr_eq(&after, &super_json.normalized()?));
        Ok(())
    }

    #[test]
    fn paths_resolve_relative_to_document() -> TestResult {
        let super_json = SuperJson::parse(DOCUMENT, "/app/superface/super.json", Environment::empty())?;
        assert_eq!(
            super_json.resolve_path("file://./first.json"),
            PathBuf::from("/app/superface/./first.json")
        );
        assert_eq!(
            super_json.grid_profile_ast_path("scope/p", "1.0.0"),
            PathBuf::from("/app/superface/grid/scope/p@1.0.0.supr.ast.json")
        );

        let bare = SuperJson::parse("{}", "super.json", Environment::empty())?;
        assert_eq!(bare.resolve_path("a.json"), PathBuf::from("./a.json"));
        Ok(())
    }

    #[test]
    fn stringified_is_pretty_with_trailing_newline() -> TestResult {
        let super_json = SuperJson::parse(r#"{"providers":{"q":"file://q.json"}}"#, "super.json", Environment::empty())?;
        assert_eq!(
            super_json.stringified()?,
            "{\n  \"providers\": {\n    \"q\": \"file://q.json\"\n  }\n}\n"
        );
        Ok(())
    }
}
