//! Filesystem boundary contract.
//!
//! Paths are absolute (or relative to the process working directory); the
//! binding pipeline resolves document-relative paths before calling the port.

use crate::BoxFuture;
use superface_shared::{ErrorCode, RequestContext, Result};
use std::path::PathBuf;

/// File system entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSystemEntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Other / unknown.
    Other,
}

/// A directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemDirEntry {
    /// Entry name (single path segment).
    pub name: Box<str>,
    /// Entry kind.
    pub kind: FileSystemEntryKind,
}

/// File system stat info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemStat {
    /// Kind of the entry.
    pub kind: FileSystemEntryKind,
    /// Size in bytes.
    pub size_bytes: u64,
}

/// Boundary contract for filesystem access.
pub trait FileSystemPort: Send + Sync {
    /// Read a UTF-8 text file.
    ///
    /// A missing file fails with `core:not_found`.
    fn read_file_text(&self, ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<Box<str>>>;

    /// Read file metadata.
    fn stat(&self, ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<FileSystemStat>>;

    /// List directory entries, sorted by name.
    fn read_dir(
        &self,
        ctx: &RequestContext,
        dir: PathBuf,
    ) -> BoxFuture<'_, Result<Vec<FileSystemDirEntry>>>;
}

/// Extension helpers for filesystem ports.
pub trait FileSystemPortExt {
    /// True when `path` exists and is a regular file.
    fn is_file(&self, ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, bool>;

    /// Read a file, mapping `core:not_found` to `None`.
    fn read_optional_text(
        &self,
        ctx: &RequestContext,
        path: PathBuf,
    ) -> BoxFuture<'_, Result<Option<Box<str>>>>;
}

impl<T> FileSystemPortExt for T
where
    T: FileSystemPort + ?Sized,
{
    fn is_file(&self, ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, bool> {
        let stat = self.stat(ctx, path);
        Box::pin(async move {
            matches!(
                stat.await,
                Ok(FileSystemStat {
                    kind: FileSystemEntryKind::File,
                    ..
                })
            )
        })
    }

    fn read_optional_text(
        &self,
        ctx: &RequestContext,
        path: PathBuf,
    ) -> BoxFuture<'_, Result<Option<Box<str>>>> {
        let read = self.read_file_text(ctx, path);
        Box::pin(async move {
            match read.await {
                Ok(text) => Ok(Some(text)),
                Err(error) if error.code == ErrorCode::not_found() => Ok(None),
                Err(error) => Err(error),
            }
        })
    }
}
