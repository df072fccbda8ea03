//! In-memory adapter implementations for port contracts.
//!
//! These implementations are intended for:
//! - Unit/integration tests
//! - Deterministic contract tests for the ports layer
//! - Exercising the binding pipeline without disk or network access

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use superface_ports::{
    BoxFuture, FileSystemDirEntry, FileSystemEntryKind, FileSystemPort, FileSystemStat, LogEvent,
    LogFields, LoggerPort,
};
use superface_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};

/// A no-op logger implementation.
#[derive(Debug, Default)]
pub struct NoopLogger;

impl LoggerPort for NoopLogger {
    fn log(&self, _event: LogEvent) {}

    fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(Self)
    }
}

/// Logger that keeps every event for later assertions.
#[derive(Debug, Default, Clone)]
pub struct RecordingLogger {
    events: Arc<Mutex<Vec<LogEvent>>>,
    base_fields: LogFields,
}

impl RecordingLogger {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events.
    pub fn events(&self) -> Vec<LogEvent> {
        lock(&self.events).clone()
    }

    /// Names of recorded events, in order.
    pub fn event_names(&self) -> Vec<String> {
        lock(&self.events)
            .iter()
            .map(|event| event.event.to_string())
            .collect()
    }
}

impl LoggerPort for RecordingLogger {
    fn log(&self, mut event: LogEvent) {
        if !self.base_fields.is_empty() {
            let mut fields = self.base_fields.clone();
            fields.extend(event.fields.take().unwrap_or_default());
            event.fields = Some(fields);
        }
        lock(&self.events).push(event);
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut base_fields = self.base_fields.clone();
        base_fields.extend(fields);
        Box::new(Self {
            events: Arc::clone(&self.events),
            base_fields,
        })
    }
}

/// In-memory filesystem keyed by normalized absolute path.
///
/// Directories exist implicitly as ancestors of inserted files.
#[derive(Debug, Default, Clone)]
pub struct InMemoryFileSystem {
    files: Arc<Mutex<BTreeMap<PathBuf, String>>>,
    reads: Arc<Mutex<Vec<PathBuf>>>,
}

impl InMemoryFileSystem {
    /// Create an empty filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a file.
    pub fn insert(&self, path: impl AsRef<Path>, contents: impl Into<String>) {
        lock(&self.files).insert(normalize(path.as_ref()), contents.into());
    }

    /// Remove a file; returns whether it existed.
    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        lock(&self.files).remove(&normalize(path.as_ref())).is_some()
    }

    /// Paths read so far, in order.
    pub fn reads(&self) -> Vec<PathBuf> {
        lock(&self.reads).clone()
    }

    fn is_dir(&self, path: &Path) -> bool {
        lock(&self.files)
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }
}

impl FileSystemPort for InMemoryFileSystem {
    fn read_file_text(&self, _ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<Box<str>>> {
        Box::pin(async move {
            let path = normalize(&path);
            lock(&self.reads).push(path.clone());
            lock(&self.files)
                .get(&path)
                .map(|contents| contents.clone().into_boxed_str())
                .ok_or_else(|| missing(&path))
        })
    }

    fn stat(&self, _ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<FileSystemStat>> {
        Box::pin(async move {
            let path = normalize(&path);
            if let Some(contents) = lock(&self.files).get(&path) {
                return Ok(FileSystemStat {
                    kind: FileSystemEntryKind::File,
                    size_bytes: contents.len() as u64,
                });
            }
            if self.is_dir(&path) {
                return Ok(FileSystemStat {
                    kind: FileSystemEntryKind::Directory,
                    size_bytes: 0,
                });
            }
            Err(missing(&path))
        })
    }

    fn read_dir(
        &self,
        _ctx: &RequestContext,
        dir: PathBuf,
    ) -> BoxFuture<'_, Result<Vec<FileSystemDirEntry>>> {
        Box::pin(async move {
            let dir = normalize(&dir);
            let files = lock(&self.files);
            let mut directories = BTreeSet::new();
            let mut entries = Vec::new();
            for path in files.keys() {
                let Ok(relative) = path.strip_prefix(&dir) else {
                    continue;
                };
                let mut components = relative.components();
                let Some(Component::Normal(first)) = components.next() else {
                    continue;
                };
                let name = first.to_string_lossy().to_string();
                if components.next().is_some() {
                    directories.insert(name);
                } else {
                    entries.push(FileSystemDirEntry {
                        name: name.into_boxed_str(),
                        kind: FileSystemEntryKind::File,
                    });
                }
            }
            if entries.is_empty() && directories.is_empty() {
                return Err(missing(&dir));
            }
            entries.extend(directories.into_iter().map(|name| FileSystemDirEntry {
                name: name.into_boxed_str(),
                kind: FileSystemEntryKind::Directory,
            }));
            entries.sort_by(|left, right| left.name.cmp(&right.name));
            Ok(entries)
        })
    }
}

fn missing(path: &Path) -> ErrorEnvelope {
    ErrorEnvelope::expected(ErrorCode::not_found(), "file not found")
        .with_metadata("path", path.to_string_lossy().to_string())
}

/// Lexically resolve `.` and `..` segments.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                normalized.pop();
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
