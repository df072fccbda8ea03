//! CLI binary entrypoint.

mod commands;
mod error;
mod format;

use clap::{Parser, Subcommand};
use commands::{run_anonymize, run_config, run_detect, run_normalize};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Env var holding the log filter directive.
const LOG_ENV: &str = "SUPERFACE_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "superface",
    version,
    about = "Inspect superface configuration documents",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Locate super.json near a directory.
    Detect {
        /// Directory to search from (defaults to current directory).
        #[arg(long)]
        cwd: Option<PathBuf>,
    },
    /// Print the normalized document with credentials redacted.
    Normalize {
        /// Document path (defaults to `SUPERFACE_PATH`, then detection).
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Print the telemetry projection and its configHash.
    Anonymize {
        /// Document path (defaults to `SUPERFACE_PATH`, then detection).
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Print the effective SDK settings.
    Config,
}

pub(crate) struct CliOutput {
    pub(crate) stdout: String,
    pub(crate) exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing();
    let mode = OutputMode::from_args(&cli.output);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => return exit_with_error(&CliError::Io(error)),
    };
    let env: BTreeMap<String, String> = std::env::vars().collect();

    match runtime.block_on(run(&cli.command, mode, &env)) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

async fn run(
    command: &Commands,
    mode: OutputMode,
    env: &BTreeMap<String, String>,
) -> Result<CliOutput, CliError> {
    match command {
        Commands::Detect { cwd } => run_detect(mode, &resolve_cwd(cwd.as_deref())?).await,
        Commands::Normalize { path } => {
            run_normalize(path.as_deref(), env, &resolve_cwd(None)?).await
        },
        Commands::Anonymize { path } => {
            run_anonymize(mode, path.as_deref(), env, &resolve_cwd(None)?).await
        },
        Commands::Config => run_config(mode, env),
    }
}

fn resolve_cwd(path: Option<&Path>) -> Result<PathBuf, CliError> {
    match path {
        Some(value) => Ok(value.to_path_buf()),
        None => Ok(std::env::current_dir()?),
    }
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(output.stdout.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
