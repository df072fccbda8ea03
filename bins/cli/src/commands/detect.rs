//! Detect command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, pretty_json};
use std::path::Path;
use superface_facade::detect_document;

/// Report the document nearest to `cwd`.
pub async fn run_detect(mode: OutputMode, cwd: &Path) -> Result<CliOutput, CliError> {
    let Some(found) = detect_document(cwd).await else {
        return Err(CliError::InvalidInput(format!(
            "no super.json found near {}",
            cwd.display()
        )));
    };

    let stdout = if mode.is_json() {
        pretty_json(&serde_json::json!({
            "status": "ok",
            "path": found.to_string_lossy(),
        }))?
    } else {
        format!("{}\n", found.display())
    };
    Ok(CliOutput {
        stdout,
        exit_code: ExitCode::Ok,
    })
}
