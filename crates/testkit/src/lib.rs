//! # superface-testkit
//!
//! Test doubles, in-memory adapters and fixture loaders.
//! This crate depends on `ports`, `domain` and `shared`.

pub mod doubles;
pub mod errors;
pub mod fixtures;
pub mod in_memory;

pub use doubles::{EchoInterpreter, RecordingRegistry, StaticValidator};
pub use fixtures::{FixtureError, fixture_path, fixture_text, load_fixture};
pub use in_memory::{InMemoryFileSystem, NoopLogger, RecordingLogger};

/// Returns the testkit crate version.
#[must_use]
pub const fn testkit_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
