// src/config/target.rs

use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, TargetConfig};
use crate::errors::{AssetpipeError, Result};
use crate::mapping::MappingOptions;
use crate::paths::{is_within, normalize_path};
use crate::types::TransformKind;

/// A named, immutable build unit: which files to take and where to put them.
///
/// All paths are absolute and normalised against the working root at
/// construction time, so a `Target` can be handed to the runner or the
/// watcher without any further context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    name: String,
    root: PathBuf,
    source_patterns: Vec<String>,
    destination_root: PathBuf,
    source_root: Option<PathBuf>,
    mapping: MappingOptions,
    transform: TransformKind,
    cmd: Option<String>,
}

impl Target {
    /// A copy target with default mapping options.
    ///
    /// `root` is the working root patterns are evaluated against;
    /// `destination_root` is resolved against it when relative.
    pub fn new(
        name: impl Into<String>,
        root: impl AsRef<Path>,
        source_patterns: Vec<String>,
        destination_root: impl AsRef<Path>,
    ) -> Self {
        let root = normalize_path(root.as_ref());
        let destination_root = normalize_path(&root.join(destination_root.as_ref()));
        Self {
            name: name.into(),
            root,
            source_patterns,
            destination_root,
            source_root: None,
            mapping: MappingOptions::default(),
            transform: TransformKind::Copy,
            cmd: None,
        }
    }

    /// Build a target from its validated config section.
    pub fn from_config(name: &str, cfg: &TargetConfig, root: &Path) -> Self {
        let mut target = Target::new(name, root, cfg.src.clone(), &cfg.dest)
            .with_mapping(MappingOptions {
                flatten: cfg.flatten,
                ext: cfg.ext.clone(),
            })
            .with_transform(cfg.transform, cfg.cmd.clone());
        if let Some(source_root) = &cfg.source_root {
            target = target.with_source_root(source_root);
        }
        target
    }

    pub fn with_source_root(mut self, source_root: impl AsRef<Path>) -> Self {
        self.source_root = Some(normalize_path(&self.root.join(source_root.as_ref())));
        self
    }

    pub fn with_mapping(mut self, mapping: MappingOptions) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_transform(mut self, transform: TransformKind, cmd: Option<String>) -> Self {
        self.transform = transform;
        self.cmd = cmd;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Working root the source patterns are relative to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_patterns(&self) -> &[String] {
        &self.source_patterns
    }

    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    /// Explicitly configured source root, if any.
    pub fn source_root(&self) -> Option<&Path> {
        self.source_root.as_deref()
    }

    /// Whether files under the destination root are kept out of this
    /// target's sources. They are, unless the destination root contains
    /// `source_root`.
    pub fn excludes_destination(&self, source_root: &Path) -> bool {
        !is_within(source_root, &self.destination_root)
    }

    pub fn mapping(&self) -> &MappingOptions {
        &self.mapping
    }

    pub fn transform(&self) -> TransformKind {
        self.transform
    }

    pub fn cmd(&self) -> Option<&str> {
        self.cmd.as_deref()
    }
}

impl ConfigFile {
    /// Look up a target by name and anchor it at `root`.
    pub fn resolve_target(&self, name: &str, root: &Path) -> Result<Target> {
        self.target(name)
            .map(|cfg| Target::from_config(name, cfg, root))
            .ok_or_else(|| AssetpipeError::TargetNotFound(name.to_string()))
    }

    /// Every configured target, in name order.
    pub fn all_targets(&self, root: &Path) -> Vec<Target> {
        self.targets()
            .iter()
            .map(|(name, cfg)| Target::from_config(name, cfg, root))
            .collect()
    }
}
