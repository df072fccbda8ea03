//! Resolution of settings that are inline artifacts, `file://` references,
//! or opaque keys looked up in the configuration document.
//!
//! The walk is a bounded loop: classify the current reference, then either
//! read the referenced file or unpack the key into the next reference.

use std::path::{Path, PathBuf};
use superface_domain::strip_file_uri;
use superface_ports::{FileSystemPort, FileSystemPortExt};
use superface_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};

/// Maximum number of key unpacking steps before resolution fails.
pub const MAX_RESOLVE_DEPTH: usize = 8;

/// A setting that is either a concrete artifact or a reference to one.
#[derive(Debug, Clone, PartialEq)]
pub enum Setting<T> {
    /// Already-parsed artifact.
    Artifact(T),
    /// `file://` URI or opaque key.
    Reference(String),
}

/// Outcome of unpacking an opaque key.
#[derive(Debug, Clone, PartialEq)]
pub enum Unpacked<T> {
    /// The key maps directly to an artifact.
    Artifact(T),
    /// The key maps to another reference to resolve.
    Reference(String),
    /// Nothing local is known for the key.
    Missing,
}

/// Resolves settings relative to a base directory.
pub struct ValueResolver<'a> {
    filesystem: &'a dyn FileSystemPort,
    base_dir: &'a Path,
}

impl<'a> ValueResolver<'a> {
    /// Resolver reading files through `filesystem`, relative to `base_dir`.
    #[must_use]
    pub fn new(filesystem: &'a dyn FileSystemPort, base_dir: &'a Path) -> Self {
        Self {
            filesystem,
            base_dir,
        }
    }

    /// Absolute (or cwd-relative) location of a document-relative path.
    #[must_use]
    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        self.base_dir.join(relative)
    }

    /// Resolve `input` to an artifact.
    ///
    /// Returns `Ok(None)` when the chain ends without a local artifact (a
    /// missing file or an unknown key); callers fall back to the registry.
    pub async fn resolve<T>(
        &self,
        ctx: &RequestContext,
        input: Option<Setting<T>>,
        parse: impl Fn(&str, &Path) -> Result<T>,
        unpack: impl Fn(&str) -> Unpacked<T>,
    ) -> Result<Option<T>> {
        let mut current = match input {
            None => return Ok(None),
            Some(Setting::Artifact(artifact)) => return Ok(Some(artifact)),
            Some(Setting::Reference(reference)) => reference,
        };

        for _ in 0..=MAX_RESOLVE_DEPTH {
            if let Some(relative) = strip_file_uri(&current) {
                let path = self.resolve_path(relative);
                let Some(text) = self
                    .filesystem
                    .read_optional_text(ctx, path.clone())
                    .await?
                else {
                    tracing::debug!(path = %path.display(), "referenced file is missing");
                    return Ok(None);
                };
                return parse(&text, &path).map(Some);
            }

            match unpack(&current) {
                Unpacked::Artifact(artifact) => return Ok(Some(artifact)),
                Unpacked::Reference(next) => current = next,
                Unpacked::Missing => return Ok(None),
            }
        }

        Err(ErrorEnvelope::expected(
            ErrorCode::new("resolve", "depth_exceeded"),
            format!("reference did not resolve within {MAX_RESOLVE_DEPTH} steps"),
        )
        .with_metadata("reference", current))
    }
}

/// Parse JSON file contents, tagging failures with the file path.
pub fn parse_json_file<T, E>(
    text: &str,
    path: &Path,
    convert: impl FnOnce(serde_json::Value) -> std::result::Result<T, E>,
) -> Result<T>
where
    E: std::fmt::Display,
{
    let invalid = |message: String| {
        ErrorEnvelope::expected(ErrorCode::new("resolve", "invalid_artifact"), message)
            .with_metadata("path", path.to_string_lossy().to_string())
    };
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|error| invalid(format!("file is not valid JSON: {error}")))?;
    convert(value).map_err(|error| invalid(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use superface_testkit::InMemoryFileSystem;

    fn parse_value(text: &str, path: &Path) -> Result<Value> {
        parse_json_file(text, path, Ok::<_, String>)
    }

    #[tokio::test]
    async fn passes_artifacts_and_absent_inputs_through() -> Result<()> {
        let fs = InMemoryFileSystem::new();
        let resolver = ValueResolver::new(&fs, Path::new("/app"));
        let ctx = RequestContext::new_request();

        let inline = resolver
            .resolve(&ctx, Some(Setting::Artifact(7)), |_, _| Ok(0), |_| Unpacked::Missing)
            .await?;
        assert_eq!(inline, Some(7));

        let absent = resolver
            .resolve::<u8>(&ctx, None, |_, _| Ok(0), |_| Unpacked::Missing)
            .await?;
        assert_eq!(absent, None);
        Ok(())
    }

    #[tokio::test]
    async fn follows_keys_to_files_relative_to_base_dir() -> Result<()> {
        let fs = InMemoryFileSystem::new();
        fs.insert("/app/superface/profiles/p.supr.ast.json", r#"{"ok":true}"#);
        let base = PathBuf::from("/app/superface");
        let resolver = ValueResolver::new(&fs, &base);
        let ctx = RequestContext::new_request();

        let resolved = resolver
            .resolve(
                &ctx,
                Some(Setting::Reference("p".to_owned())),
                parse_value,
                |key| match key {
                    "p" => Unpacked::Reference("alias".to_owned()),
                    "alias" => Unpacked::Reference("file://profiles/p.supr.ast.json".to_owned()),
                    _ => Unpacked::Missing,
                },
            )
            .await?;
        assert_eq!(resolved, Some(serde_json::json!({ "ok": true })));
        Ok(())
    }

    #[tokio::test]
    async fn missing_files_and_unknown_keys_resolve_to_none() -> Result<()> {
        let fs = InMemoryFileSystem::new();
        let resolver = ValueResolver::new(&fs, Path::new("/app"));
        let ctx = RequestContext::new_request();

        let missing_file = resolver
            .resolve(
                &ctx,
                Some(Setting::Reference("file://nope.json".to_owned())),
                parse_value,
                |_| Unpacked::Missing,
            )
            .await?;
        assert_eq!(missing_file, None);

        let unknown_key = resolver
            .resolve(&ctx, Some(Setting::Reference("q".to_owned())), parse_value, |_| {
                Unpacked::Missing
            })
            .await?;
        assert_eq!(unknown_key, None);
        Ok(())
    }

    #[tokio::test]
    async fn cyclic_keys_fail_with_depth_error() {
        let fs = InMemoryFileSystem::new();
        let resolver = ValueResolver::new(&fs, Path::new("/app"));
        let ctx = RequestContext::new_request();

        let result = resolver
            .resolve(
                &ctx,
                Some(Setting::Reference("a".to_owned())),
                parse_value,
                |key| Unpacked::Reference(if key == "a" { "b" } else { "a" }.to_owned()),
            )
            .await;
        assert_eq!(
            result.err().map(|error| error.code),
            Some(ErrorCode::new("resolve", "depth_exceeded"))
        );
    }

    #[tokio::test]
    async fn malformed_files_fail_with_path() {
        let fs = InMemoryFileSystem::new();
        fs.insert("/app/broken.json", "{");
        let resolver = ValueResolver::new(&fs, Path::new("/app"));
        let ctx = RequestContext::new_request();

        let result = resolver
            .resolve(
                &ctx,
                Some(Setting::Reference("file://broken.json".to_owned())),
                parse_value,
                |_| Unpacked::Missing,
            )
            .await;
        let Err(error) = result else {
            panic!("expected a parse error");
        };
        assert_eq!(error.code, ErrorCode::new("resolve", "invalid_artifact"));
        assert_eq!(error.metadata.get("path").map(String::as_str), Some("/app/broken.json"));
    }
}
