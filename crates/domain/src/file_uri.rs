//! `file://` URI convention for local-file-backed settings.

/// Prefix marking a local-file-backed setting.
pub const FILE_URI_PREFIX: &str = "file://";

/// Returns true when `input` uses the file-URI convention.
#[must_use]
pub fn is_file_uri(input: &str) -> bool {
    input.starts_with(FILE_URI_PREFIX)
}

/// Strip the `file://` prefix; `None` when `input` is not a file URI.
#[must_use]
pub fn strip_file_uri(input: &str) -> Option<&str> {
    input.strip_prefix(FILE_URI_PREFIX)
}

/// Render a path as a file URI.
#[must_use]
pub fn to_file_uri(path: &str) -> String {
    format!("{FILE_URI_PREFIX}{path}")
}
