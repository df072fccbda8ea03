//! Document inspection handlers (`normalize`, `anonymize`).

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, pretty_json};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use superface_facade::{
    Environment, anonymized_summary, detect_document, load_document, load_sdk_config,
    normalized_document,
};

const PATH_ENV: &str = "SUPERFACE_PATH";

/// `--path`, else `SUPERFACE_PATH`, else detection from `cwd`.
async fn resolve_document_path(
    path: Option<&Path>,
    env: &BTreeMap<String, String>,
    cwd: &Path,
) -> Result<PathBuf, CliError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if env.contains_key(PATH_ENV) {
        return Ok(load_sdk_config(env)?.super_json_path);
    }
    detect_document(cwd).await.ok_or_else(|| {
        CliError::InvalidInput(format!("no super.json found near {}", cwd.display()))
    })
}

/// Print the normalized document with credentials redacted.
pub async fn run_normalize(
    path: Option<&Path>,
    env: &BTreeMap<String, String>,
    cwd: &Path,
) -> Result<CliOutput, CliError> {
    let path = resolve_document_path(path, env, cwd).await?;
    let super_json = load_document(&path, Environment::from_map(env.clone())).await?;
    let normalized = normalized_document(&super_json)?;
    Ok(CliOutput {
        stdout: pretty_json(&normalized)?,
        exit_code: ExitCode::Ok,
    })
}

/// Print the telemetry projection and its hash.
pub async fn run_anonymize(
    mode: OutputMode,
    path: Option<&Path>,
    env: &BTreeMap<String, String>,
    cwd: &Path,
) -> Result<CliOutput, CliError> {
    let path = resolve_document_path(path, env, cwd).await?;
    let super_json = load_document(&path, Environment::from_map(env.clone())).await?;
    let summary = anonymized_summary(&super_json)?;

    let stdout = if mode.is_json() {
        pretty_json(&summary)?
    } else {
        format!(
            "configHash: {}\n{}",
            summary.config_hash,
            pretty_json(&summary.anonymized)?
        )
    };
    Ok(CliOutput {
        stdout,
        exit_code: ExitCode::Ok,
    })
}
