//! Loader for JSON fixtures shipped under `crates/testkit/fixtures`.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::{fmt, fs};

/// Errors raised while loading fixtures.
#[derive(Debug)]
pub enum FixtureError {
    /// Fixture file does not exist.
    MissingFixture {
        /// Path that could not be found.
        path: PathBuf,
    },
    /// Fixture file could not be read.
    FixtureRead {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Fixture file could not be parsed.
    FixtureParse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

impl fmt::Display for FixtureError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFixture { path } => {
                write!(formatter, "missing fixture: {}", path.display())
            },
            Self::FixtureRead { path, source } => {
                write!(formatter, "failed to read fixture {}: {source}", path.display())
            },
            Self::FixtureParse { path, source } => {
                write!(formatter, "failed to parse fixture {}: {source}", path.display())
            },
        }
    }
}

impl std::error::Error for FixtureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FixtureRead { source, .. } => Some(source),
            Self::FixtureParse { source, .. } => Some(source),
            Self::MissingFixture { .. } => None,
        }
    }
}

/// Root directory of the fixture tree.
#[must_use]
pub fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Absolute path of a fixture (`superjson/full.json`).
#[must_use]
pub fn fixture_path(relative: &str) -> PathBuf {
    fixture_root().join(relative)
}

/// Raw fixture text.
pub fn fixture_text(relative: &str) -> Result<String, FixtureError> {
    let path = fixture_path(relative);
    if !path.exists() {
        return Err(FixtureError::MissingFixture { path });
    }
    fs::read_to_string(&path).map_err(|source| FixtureError::FixtureRead { path, source })
}

/// Parse a JSON fixture into `T`.
pub fn load_fixture<T: DeserializeOwned>(relative: &str) -> Result<T, FixtureError> {
    let text = fixture_text(relative)?;
    serde_json::from_str(&text).map_err(|source| FixtureError::FixtureParse {
        path: fixture_path(relative),
        source,
    })
}
