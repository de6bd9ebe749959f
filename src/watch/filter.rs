// src/watch/filter.rs

use std::path::{Path, PathBuf};

use crate::config::Target;
use crate::engine::FileChange;
use crate::errors::Result;
use crate::paths::{normalize_path, relative_str};
use crate::resolve::PatternList;
use crate::types::ChangeKind;

use super::watcher::Extent;

/// Decides which raw filesystem events matter to one target.
///
/// A path is relevant when the target's ordered pattern list selects it.
/// Paths under the destination root are ignored so the target's own
/// output cannot retrigger it, unless the destination root contains the
/// source root (then ignoring it would hide every source).
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    patterns: PatternList,
    watch_root: PathBuf,
    destination_root: PathBuf,
    ignore_destination: bool,
}

impl ChangeFilter {
    pub fn for_target(target: &Target) -> Result<Self> {
        let patterns = PatternList::compile(target.root(), target.source_patterns())?;
        let watch_root = target
            .source_root()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| patterns.source_root());
        let destination_root = normalize_path(target.destination_root());
        let ignore_destination = target.excludes_destination(&watch_root);

        Ok(Self {
            patterns,
            watch_root,
            destination_root,
            ignore_destination,
        })
    }

    /// Directory the subscription is placed on.
    pub fn watch_root(&self) -> &Path {
        &self.watch_root
    }

    /// Whether a change at `path` (absolute) is relevant.
    pub fn accepts(&self, path: &Path) -> bool {
        let path = normalize_path(path);
        if self.ignore_destination && path.starts_with(&self.destination_root) {
            return false;
        }
        self.patterns.matches(&path)
    }

    /// Whether a change covering the whole tree at `dir` (absolute) may
    /// touch a source: some include pattern walks `dir` or lies beneath it.
    pub fn accepts_tree(&self, dir: &Path) -> bool {
        let dir = normalize_path(dir);
        if self.ignore_destination && dir.starts_with(&self.destination_root) {
            return false;
        }
        self.patterns
            .iter()
            .filter(|p| !p.is_negated())
            .any(|p| p.base().starts_with(&dir) || dir.starts_with(p.base()))
    }

    /// Turn a path reported by the OS into a [`FileChange`], if relevant.
    ///
    /// Reported paths may use a different spelling of the watch root (for
    /// example through a symlinked temp dir); they are re-anchored on
    /// [`watch_root`](Self::watch_root) so they compare equal to resolved
    /// sources.
    pub fn to_change(
        &self,
        reported: &Path,
        kind: ChangeKind,
        extent: Extent,
    ) -> Option<FileChange> {
        let rel = relative_str(&self.watch_root, reported)?;
        let path = normalize_path(&self.watch_root.join(rel));
        let relevant = match extent {
            Extent::Path => self.accepts(&path),
            Extent::Tree => self.accepts(&path) || self.accepts_tree(&path),
        };
        relevant.then(|| FileChange::new(path, kind))
    }
}
