//! Config command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, pretty_json};
use std::collections::BTreeMap;
use superface_facade::{SdkConfigSummary, load_sdk_config, sdk_config_summary};

/// Print the effective SDK settings; the token is never shown.
pub fn run_config(mode: OutputMode, env: &BTreeMap<String, String>) -> Result<CliOutput, CliError> {
    let summary = sdk_config_summary(&load_sdk_config(env)?);
    let stdout = if mode.is_json() {
        pretty_json(&summary)?
    } else {
        format_config_text(&summary)
    };
    Ok(CliOutput {
        stdout,
        exit_code: ExitCode::Ok,
    })
}

fn format_config_text(summary: &SdkConfigSummary) -> String {
    format!(
        "registryUrl: {}\nsdkToken: {}\nsuperJsonPath: {}\n",
        summary.registry_url,
        summary.sdk_token.as_deref().unwrap_or("none"),
        summary.super_json_path
    )
}
