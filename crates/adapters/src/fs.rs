//! Local filesystem adapter.

use superface_ports::{
    BoxFuture, FileSystemDirEntry, FileSystemEntryKind, FileSystemPort, FileSystemStat,
};
use superface_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::fs::FileType;
use std::path::PathBuf;

/// Local filesystem adapter using async IO.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystem {
    max_file_size_bytes: Option<u64>,
}

impl LocalFileSystem {
    /// Build a filesystem adapter with an optional max file size.
    pub const fn new(max_file_size_bytes: Option<u64>) -> Self {
        Self {
            max_file_size_bytes,
        }
    }
}

fn entry_kind(file_type: FileType) -> FileSystemEntryKind {
    if file_type.is_file() {
        FileSystemEntryKind::File
    } else if file_type.is_dir() {
        FileSystemEntryKind::Directory
    } else {
        FileSystemEntryKind::Other
    }
}

fn with_path(error: std::io::Error, path: &std::path::Path) -> ErrorEnvelope {
    ErrorEnvelope::from(error).with_metadata("path", path.to_string_lossy().to_string())
}

impl FileSystemPort for LocalFileSystem {
    fn read_file_text(&self, _ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<Box<str>>> {
        let max_file_size_bytes = self.max_file_size_bytes;
        Box::pin(async move {
            let metadata = tokio::fs::metadata(&path)
                .await
                .map_err(|error| with_path(error, &path))?;
            if !metadata.is_file() {
                return Err(ErrorEnvelope::expected(
                    ErrorCode::invalid_input(),
                    "path is not a file",
                )
                .with_metadata("path", path.to_string_lossy().to_string()));
            }
            if let Some(limit) = max_file_size_bytes
                && metadata.len() > limit
            {
                return Err(ErrorEnvelope::expected(
                    ErrorCode::invalid_input(),
                    "file exceeds max size",
                )
                .with_metadata("path", path.to_string_lossy().to_string()));
            }

            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|error| with_path(error, &path))?;
            Ok(contents.into_boxed_str())
        })
    }

    fn stat(&self, _ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<FileSystemStat>> {
        Box::pin(async move {
            let metadata = tokio::fs::metadata(&path)
                .await
                .map_err(|error| with_path(error, &path))?;
            Ok(FileSystemStat {
                kind: entry_kind(metadata.file_type()),
                size_bytes: metadata.len(),
            })
        })
    }

    fn read_dir(
        &self,
        _ctx: &RequestContext,
        dir: PathBuf,
    ) -> BoxFuture<'_, Result<Vec<FileSystemDirEntry>>> {
        Box::pin(async move {
            let mut entries = Vec::new();
            let mut read_dir = tokio::fs::read_dir(&dir)
                .await
                .map_err(|error| with_path(error, &dir))?;

            while let Some(entry) = read_dir.next_entry().await.map_err(ErrorEnvelope::from)? {
                let file_type = entry.file_type().await.map_err(ErrorEnvelope::from)?;
                let name = entry
                    .file_name()
                    .to_string_lossy()
                    .to_string()
                    .into_boxed_str();
                entries.push(FileSystemDirEntry {
                    name,
                    kind: entry_kind(file_type),
                });
            }

            entries.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(entries)
        })
    }
}
