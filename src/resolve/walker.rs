// src/resolve/walker.rs

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::trace;

use crate::fs::FileSystem;
use crate::paths::normalize_path;

/// Collect every regular file at or beneath `base`, in sorted depth-first
/// order.
///
/// Symbolic links are skipped, never followed, so link cycles cannot
/// occur. A missing `base` yields an empty list.
pub fn walk_files(fs: &dyn FileSystem, base: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if fs.is_symlink(base) {
        trace!(path = ?base, "walk base is a symlink; skipping");
        return Ok(files);
    }
    if fs.is_file(base) {
        files.push(normalize_path(base));
        return Ok(files);
    }
    if !fs.is_dir(base) {
        return Ok(files);
    }

    // Entries are pushed in reverse sorted order so that popping yields a
    // sorted pre-order walk.
    let mut stack = sorted_children(fs, base)?;
    while let Some(path) = stack.pop() {
        if fs.is_symlink(&path) {
            trace!(?path, "skipping symlink");
        } else if fs.is_dir(&path) {
            stack.extend(sorted_children(fs, &path)?);
        } else if fs.is_file(&path) {
            files.push(normalize_path(&path));
        }
    }

    Ok(files)
}

fn sorted_children(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut children = fs.read_dir(dir)?;
    children.sort_by(|a, b| b.cmp(a));
    Ok(children)
}
