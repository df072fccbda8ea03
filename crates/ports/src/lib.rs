//! # superface-ports
//!
//! Port traits for the Superface SDK hexagonal architecture.
//!
//! This crate defines the interfaces between the binding pipeline and its
//! external collaborators. It depends only on `config`, `domain` and `shared`.

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by port traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod filesystem;
pub mod interpreter;
pub mod logger;
pub mod registry;
pub mod validator;

pub use filesystem::*;
pub use interpreter::*;
pub use logger::*;
pub use registry::*;
pub use validator::*;

// Re-export selected domain types used in port signatures, so adapter crates
// can implement ports without directly depending on `superface-domain`.
pub use superface_domain::{MapAst, ProfileAst, ProviderInfo, ProviderJson, SecurityConfiguration};

#[cfg(test)]
mod tests {
    use super::*;
    use superface_domain::domain_crate_version;
    use superface_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;
        let mut in_dev_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]";
                in_dev_deps = line == "[dev-dependencies]";
                continue;
            }
            if !(in_deps || in_dev_deps) {
                continue;
            }
            if line.starts_with("superface-") {
                let key = line.split('=').next().unwrap_or("").trim();
                let name = key.split('.').next().unwrap_or("").trim();
                deps.push(name.to_string());
            }
        }

        deps
    }

    #[test]
    fn ports_depends_only_on_lower_layers() {
        let deps = workspace_deps();
        let allowed = ["superface-config", "superface-domain", "superface-shared"];

        for dep in &deps {
            assert!(
                allowed.contains(&dep.as_str()),
                "unexpected dependency found: {dep}"
            );
        }

        for expected in allowed {
            assert!(
                deps.iter().any(|dep| dep == expected),
                "missing dependency: {expected}"
            );
        }
    }

    #[test]
    fn ports_can_use_domain_and_shared() {
        let domain_version = domain_crate_version();
        let shared_version = shared_crate_version();

        assert!(!domain_version.is_empty());
        assert!(!shared_version.is_empty());
        assert!(!ports_crate_version().is_empty());
    }
}
