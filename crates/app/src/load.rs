//! Loading the configuration document through the filesystem port.

use std::path::Path;
use superface_config::{Environment, SuperJson};
use superface_ports::FileSystemPort;
use superface_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};

/// Read, parse and schema-validate the document at `path`.
pub async fn load_super_json(
    ctx: &RequestContext,
    filesystem: &dyn FileSystemPort,
    path: &Path,
    environment: Environment,
) -> Result<SuperJson> {
    let text = filesystem
        .read_file_text(ctx, path.to_path_buf())
        .await
        .map_err(|error| {
            if error.code == ErrorCode::not_found() {
                ErrorEnvelope::expected(
                    ErrorCode::new("superjson", "file_not_found"),
                    format!("super.json not found at {}", path.display()),
                )
                .with_metadata("path", path.to_string_lossy().to_string())
            } else {
                error
            }
        })?;
    SuperJson::parse(&text, path, environment)
}
