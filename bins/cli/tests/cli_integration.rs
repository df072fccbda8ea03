//! CLI integration tests.

use serde_json::Value;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const SUPERFACE_ENV: [&str; 4] = [
    "SUPERFACE_API_URL",
    "SUPERFACE_SDK_TOKEN",
    "SUPERFACE_PATH",
    "SUPERFACE_LOG",
];

fn run_cli(args: &[&str], env: &[(&str, &str)]) -> std::io::Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_superface"));
    command.args(args);
    for key in SUPERFACE_ENV {
        command.env_remove(key);
    }
    for (key, value) in env {
        command.env(key, value);
    }
    command.output()
}

fn temp_dir(label: &str) -> std::io::Result<PathBuf> {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("superface-cli-{label}-{unique}"));
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn write_document(root: &Path) -> std::io::Result<PathBuf> {
    let dir = root.join("superface");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("super.json");
    std::fs::write(
        &path,
        r#"{
  "profiles": {
    "communication/send-email": {
      "version": "1.2.0",
      "priority": ["sendgrid"],
      "providers": { "sendgrid": {} }
    }
  },
  "providers": {
    "sendgrid": {
      "file": "providers/sendgrid.json",
      "security": [{ "id": "bearer", "token": "$SENDGRID_TOKEN" }]
    }
  }
}
"#,
    )?;
    Ok(path)
}

fn stdout_json(output: &Output) -> Result<Value, Box<dyn Error>> {
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn detect_finds_document_from_nested_directory() -> Result<(), Box<dyn Error>> {
    let root = temp_dir("detect")?;
    let path = write_document(&root)?;
    let nested = root.join("src");
    std::fs::create_dir_all(&nested)?;

    let output = run_cli(&["detect", "--cwd", &nested.to_string_lossy(), "--json"], &[])?;
    assert!(output.status.success());
    let json = stdout_json(&output)?;
    assert_eq!(json["path"], Value::from(path.to_string_lossy().to_string()));

    std::fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn normalize_substitutes_and_redacts_credentials() -> Result<(), Box<dyn Error>> {
    let root = temp_dir("normalize")?;
    let path = write_document(&root)?;

    let output = run_cli(
        &["normalize", "--path", &path.to_string_lossy()],
        &[("SENDGRID_TOKEN", "sg-secret")],
    )?;
    assert!(output.status.success());
    let json = stdout_json(&output)?;
    assert_eq!(
        json["providers"]["sendgrid"]["security"][0]["token"],
        Value::from("[REDACTED]")
    );
    assert_eq!(
        json["profiles"]["communication/send-email"]["priority"][0],
        Value::from("sendgrid")
    );
    assert!(!String::from_utf8_lossy(&output.stdout).contains("sg-secret"));

    std::fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn anonymize_reports_stable_hash() -> Result<(), Box<dyn Error>> {
    let root = temp_dir("anonymize")?;
    let path = write_document(&root)?;
    let path_arg = path.to_string_lossy().to_string();

    let first = run_cli(&["anonymize", "--path", &path_arg, "--json"], &[("SENDGRID_TOKEN", "a")])?;
    let second = run_cli(&["anonymize", "--json"], &[("SUPERFACE_PATH", &path_arg)])?;
    assert!(first.status.success());
    assert!(second.status.success());

    let first = stdout_json(&first)?;
    let second = stdout_json(&second)?;
    let hash = first["configHash"].as_str().ok_or("missing configHash")?;
    assert_eq!(hash.len(), 64);
    assert_eq!(first["configHash"], second["configHash"]);
    assert!(!first.to_string().contains("providers/sendgrid.json"));

    std::fs::remove_dir_all(&root)?;
    Ok(())
}

#[test]
fn config_redacts_token_and_rejects_bad_urls() -> Result<(), Box<dyn Error>> {
    let output = run_cli(
        &["config", "--json"],
        &[("SUPERFACE_SDK_TOKEN", "sfs_demo_0123abcd")],
    )?;
    assert!(output.status.success());
    let json = stdout_json(&output)?;
    assert_eq!(json["sdkToken"], Value::from("[REDACTED]"));
    assert_eq!(json["registryUrl"], Value::from("https://superface.ai"));

    let output = run_cli(&["config"], &[("SUPERFACE_API_URL", "not a url")])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("config:invalid_env_url"));
    Ok(())
}

#[test]
fn missing_document_exits_with_invalid_input() -> Result<(), Box<dyn Error>> {
    let root = temp_dir("missing")?;
    let output = run_cli(
        &["normalize", "--path", &root.join("super.json").to_string_lossy()],
        &[],
    )?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("superjson:file_not_found"));

    std::fs::remove_dir_all(&root)?;
    Ok(())
}
