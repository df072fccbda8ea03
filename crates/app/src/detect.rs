//! Configuration document detection.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use superface_config::{SUPER_JSON_FILE, SUPERFACE_DIR};
use superface_ports::{FileSystemEntryKind, FileSystemPort, FileSystemPortExt};
use superface_shared::RequestContext;

/// Parent levels probed above the starting directory.
pub const DETECT_LEVELS_UP: usize = 2;
/// Child levels probed below the starting directory.
pub const DETECT_LEVELS_DOWN: usize = 2;

/// Find the configuration document nearest to `cwd`.
///
/// Probes `super.json` and `superface/super.json` in `cwd` and its parents
/// first, then breadth-first in subdirectories. Hidden directories are
/// skipped on the way down.
pub async fn detect_super_json(
    ctx: &RequestContext,
    filesystem: &dyn FileSystemPort,
    cwd: &Path,
) -> Option<PathBuf> {
    for dir in cwd.ancestors().take(DETECT_LEVELS_UP + 1) {
        if let Some(found) = probe(ctx, filesystem, dir).await {
            return Some(found);
        }
    }

    let mut queue: VecDeque<(PathBuf, usize)> = VecDeque::from([(cwd.to_path_buf(), 0)]);
    while let Some((dir, depth)) = queue.pop_front() {
        if depth > 0
            && let Some(found) = probe(ctx, filesystem, &dir).await
        {
            return Some(found);
        }
        if depth == DETECT_LEVELS_DOWN {
            continue;
        }
        let Ok(entries) = filesystem.read_dir(ctx, dir.clone()).await else {
            continue;
        };
        for entry in entries {
            if entry.kind == FileSystemEntryKind::Directory && !entry.name.starts_with('.') {
                queue.push_back((dir.join(entry.name.as_ref()), depth + 1));
            }
        }
    }

    None
}

async fn probe(ctx: &RequestContext, filesystem: &dyn FileSystemPort, dir: &Path) -> Option<PathBuf> {
    for candidate in [
        dir.join(SUPER_JSON_FILE),
        dir.join(SUPERFACE_DIR).join(SUPER_JSON_FILE),
    ] {
        if filesystem.is_file(ctx, candidate.clone()).await {
            return Some(candidate);
        }
    }
    None
}
