//! Synchronous document loading and serialization helpers.
//!
//! The SDK pipeline loads documents through the file-system port; these
//! helpers serve the CLI and fixture tests.

use crate::env::Environment;
use crate::super_json::SuperJson;
use serde::Serialize;
use std::path::{Path, PathBuf};
use superface_shared::{ErrorClass, ErrorCode, ErrorEnvelope};

/// Conventional directory holding the document.
pub const SUPERFACE_DIR: &str = "superface";
/// Conventional document file name.
pub const SUPER_JSON_FILE: &str = "super.json";
/// Directory (next to the document) holding registry profile ASTs.
pub const GRID_DIR: &str = "grid";
/// Suffix of compiled profile and map ASTs.
pub const AST_SUFFIX: &str = ".ast.json";

/// Read, parse and schema-validate a document from disk.
pub fn load_super_json_from_path(
    path: &Path,
    environment: Environment,
) -> Result<SuperJson, ErrorEnvelope> {
    let text = read_super_json_file(path)?;
    SuperJson::parse(&text, path, environment)
}

/// Path of the compiled AST for a profile (`.supr`) or map (`.suma`) source.
///
/// Paths that already point at JSON are returned unchanged.
#[must_use]
pub fn compiled_ast_path(path: &Path) -> PathBuf {
    match path.extension().and_then(|extension| extension.to_str()) {
        Some("supr" | "suma") => {
            let mut annotated = path.as_os_str().to_owned();
            annotated.push(AST_SUFFIX);
            PathBuf::from(annotated)
        },
        _ => path.to_path_buf(),
    }
}

/// Document-relative location of a registry profile AST.
#[must_use]
pub fn grid_profile_ast_path(profile_id: &str, version: &str) -> PathBuf {
    Path::new(GRID_DIR).join(format!("{profile_id}@{version}.supr{AST_SUFFIX}"))
}

/// Serialize as deterministic pretty JSON (with trailing newline).
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(value).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize JSON: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

fn read_super_json_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("superjson", "file_not_found"),
            std::io::ErrorKind::PermissionDenied => ErrorCode::permission_denied(),
            _ => ErrorCode::io(),
        };

        ErrorEnvelope::expected(code, format!("failed to read super.json: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}
