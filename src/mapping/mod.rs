// src/mapping/mod.rs

//! Source → destination path mapping.
//!
//! Everything here is pure: paths are compared lexically and nothing touches
//! the filesystem.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::{AssetpipeError, Collision, CollisionError, Result};
use crate::paths::normalize_path;
use crate::resolve::ResolvedFileSet;

/// A resolved `(source, destination)` pair for one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetMapping {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl AssetMapping {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl fmt::Display for AssetMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.source.display(),
            self.destination.display()
        )
    }
}

/// Extra rewriting applied after re-rooting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingOptions {
    /// Drop the relative directories and keep only the file name.
    pub flatten: bool,
    /// Replace the file extension, starting at the first `.` of the name
    /// (so `a.test.js` with `.min.js` becomes `a.min.js`).
    pub ext: Option<String>,
}

/// Re-root `source` from `source_root` to `destination_root`.
///
/// Fails with [`AssetpipeError::PathOutsideRoot`] unless `source` lies
/// strictly inside `source_root`.
pub fn map_path(source: &Path, source_root: &Path, destination_root: &Path) -> Result<PathBuf> {
    let source = normalize_path(source);
    let root = normalize_path(source_root);

    let relative = relative_to(&source, &root).ok_or_else(|| AssetpipeError::PathOutsideRoot {
        path: source.clone(),
        root: root.clone(),
    })?;

    Ok(normalize_path(&normalize_path(destination_root).join(relative)))
}

/// [`map_path`] followed by the `flatten` / `ext` rewrites.
pub fn map_path_with(
    source: &Path,
    source_root: &Path,
    destination_root: &Path,
    options: &MappingOptions,
) -> Result<PathBuf> {
    let mut destination = map_path(source, source_root, destination_root)?;

    if options.flatten {
        if let Some(name) = destination.file_name().map(|n| n.to_os_string()) {
            destination = normalize_path(destination_root).join(name);
        }
    }

    if let Some(ext) = &options.ext {
        destination = replace_extension(&destination, ext);
    }

    Ok(destination)
}

fn relative_to<'a>(path: &'a Path, root: &Path) -> Option<&'a Path> {
    let relative = if root == Path::new(".") {
        if path.is_absolute() || path.starts_with("..") {
            return None;
        }
        path
    } else {
        path.strip_prefix(root).ok()?
    };

    if relative.as_os_str().is_empty() || relative == Path::new(".") {
        None
    } else {
        Some(relative)
    }
}

fn replace_extension(path: &Path, ext: &str) -> PathBuf {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return path.to_path_buf();
    };

    // Leading dots belong to the name (`.eslintrc`), not the extension.
    let leading = name.len() - name.trim_start_matches('.').len();
    let stem = match name[leading..].find('.') {
        Some(idx) => &name[..leading + idx],
        None => name,
    };

    path.with_file_name(format!("{stem}{ext}"))
}

/// Map every file of a resolved set.
///
/// Stops at the first source outside `source_root`.
pub fn build_mappings(
    files: &ResolvedFileSet,
    source_root: &Path,
    destination_root: &Path,
    options: &MappingOptions,
) -> Result<Vec<AssetMapping>> {
    files
        .iter()
        .map(|source| {
            let destination = map_path_with(source, source_root, destination_root, options)?;
            Ok(AssetMapping::new(source.clone(), destination))
        })
        .collect()
}

/// Find every destination claimed by more than one source.
///
/// Collisions are listed in the order their destination first appears.
pub fn detect_collisions(mappings: &[AssetMapping]) -> Option<CollisionError> {
    let mut by_destination: HashMap<&Path, Vec<&Path>> = HashMap::new();
    let mut order: Vec<&Path> = Vec::new();

    for mapping in mappings {
        let sources = by_destination
            .entry(mapping.destination.as_path())
            .or_insert_with(|| {
                order.push(mapping.destination.as_path());
                Vec::new()
            });
        sources.push(mapping.source.as_path());
    }

    let collisions: Vec<Collision> = order
        .into_iter()
        .filter_map(|destination| {
            let sources = by_destination.get(destination)?;
            (sources.len() > 1).then(|| Collision {
                destination: destination.to_path_buf(),
                sources: sources.iter().map(|s| s.to_path_buf()).collect(),
            })
        })
        .collect();

    if collisions.is_empty() {
        None
    } else {
        Some(CollisionError { collisions })
    }
}

/// Split mappings into the ones safe to run and the collision report.
///
/// Every mapping whose destination collides is dropped, so no source of a
/// colliding group is ever handed to a transform.
pub fn partition_collisions(
    mappings: Vec<AssetMapping>,
) -> (Vec<AssetMapping>, Option<CollisionError>) {
    let Some(collision) = detect_collisions(&mappings) else {
        return (mappings, None);
    };

    let colliding: Vec<&Path> = collision
        .collisions
        .iter()
        .map(|c| c.destination.as_path())
        .collect();

    let safe = mappings
        .iter()
        .filter(|m| !colliding.contains(&m.destination.as_path()))
        .cloned()
        .collect();

    (safe, Some(collision))
}
