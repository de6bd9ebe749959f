// src/resolve/mod.rs

//! Source file resolution.
//!
//! Turns a target's ordered include/exclude patterns into a
//! [`ResolvedFileSet`]:
//! - [`pattern`] compiles patterns and answers single-path membership.
//! - [`walker`] lists the regular files under a pattern's base directory.
//!
//! Resolution is synchronous and only reads the filesystem.

pub mod pattern;
pub mod walker;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::Result;
use crate::fs::FileSystem;

pub use pattern::{NEGATION_MARKER, Pattern, PatternList};
pub use walker::walk_files;

/// Deduplicated source paths in first-match order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFileSet {
    paths: Vec<PathBuf>,
    members: HashSet<PathBuf>,
}

impl ResolvedFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `path` unless already present. Returns true if it was added.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        if !self.members.insert(path.clone()) {
            return false;
        }
        self.paths.push(path);
        true
    }

    /// Remove every path selected by `predicate`, keeping the order of the
    /// rest. Returns how many were removed.
    pub fn remove_matching(&mut self, mut predicate: impl FnMut(&Path) -> bool) -> usize {
        let before = self.paths.len();
        let members = &mut self.members;
        self.paths.retain(|p| {
            if predicate(p.as_path()) {
                members.remove(p);
                false
            } else {
                true
            }
        });
        before - self.paths.len()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.members.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.paths.iter()
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn into_vec(self) -> Vec<PathBuf> {
        self.paths
    }
}

impl<'a> IntoIterator for &'a ResolvedFileSet {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// Resolve `patterns` (relative to `root`) into the set of matching files.
pub fn resolve(fs: &dyn FileSystem, root: &Path, patterns: &[String]) -> Result<ResolvedFileSet> {
    let list = PatternList::compile(root, patterns)?;
    resolve_list(fs, &list)
}

/// Resolve an already compiled pattern list.
///
/// Includes append the files they match (in walk order) that are not yet
/// present; negations drop matching paths from what has been collected so
/// far. A later include may re-add a path an earlier negation removed.
pub fn resolve_list(fs: &dyn FileSystem, list: &PatternList) -> Result<ResolvedFileSet> {
    let mut set = ResolvedFileSet::new();
    let mut walks: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();

    for pattern in list.iter() {
        if pattern.is_negated() {
            let removed = set.remove_matching(|p| pattern.matches_path(p));
            debug!(pattern = %pattern.raw(), removed, "applied exclusion pattern");
            continue;
        }

        if !walks.contains_key(pattern.base()) {
            let files = walk_files(fs, pattern.base())?;
            walks.insert(pattern.base().to_path_buf(), files);
        }

        let mut added = 0usize;
        if let Some(candidates) = walks.get(pattern.base()) {
            for file in candidates {
                if pattern.matches_path(file) && set.insert(file.clone()) {
                    added += 1;
                }
            }
        }
        debug!(pattern = %pattern.raw(), added, "applied include pattern");
    }

    debug!(
        root = ?list.root(),
        patterns = list.len(),
        files = set.len(),
        "resolved source files"
    );
    Ok(set)
}
