//! Owned caches backing the client.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use superface_app::{BoundProfileProvider, load_super_json};
use superface_config::{Environment, SuperJson};
use superface_ports::FileSystemPort;
use superface_shared::{KeyedOnceCache, RequestContext, Result};

/// Loaded configuration documents keyed by resolved path.
///
/// Share one instance between clients to parse each file at most once.
#[derive(Debug, Default)]
pub struct DocumentCache {
    documents: KeyedOnceCache<PathBuf, SuperJson>,
}

impl DocumentCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the document at `path`, loading it on first use.
    pub async fn load(
        &self,
        ctx: &RequestContext,
        filesystem: &dyn FileSystemPort,
        path: &Path,
        environment: &Environment,
    ) -> Result<Arc<SuperJson>> {
        let resolved = resolve_document_path(path)?;
        self.documents
            .get_or_try_init(resolved.clone(), || {
                load_super_json(ctx, filesystem, &resolved, environment.clone())
            })
            .await
    }

    /// Number of loaded documents.
    pub async fn len(&self) -> usize {
        self.documents.len().await
    }

    /// Returns true when nothing is loaded.
    pub async fn is_empty(&self) -> bool {
        self.documents.is_empty().await
    }

    /// Forget every document.
    pub async fn clear(&self) {
        self.documents.clear().await;
    }
}

/// Bound providers keyed by profile, provider and bind configuration.
pub(crate) type BoundProviderCache = KeyedOnceCache<String, BoundProfileProvider>;

/// Absolute form of `path` with `.` and `..` segments resolved lexically.
fn resolve_document_path(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                resolved.pop();
            },
            other => resolved.push(other.as_os_str()),
        }
    }
    Ok(resolved)
}
