// src/pipeline/copy.rs

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::fs::FileSystem;
use crate::mapping::AssetMapping;
use crate::pipeline::hash::{compute_bytes_hash, compute_file_hash};

use super::transform::{Transform, TransformFuture, TransformOutcome};

/// Copies each source to its destination.
///
/// If the destination already holds identical bytes (same blake3 hash) the
/// write is skipped. Besides saving IO, this keeps an unchanged output from
/// producing a change event of its own while watching.
#[derive(Debug, Clone)]
pub struct CopyTransform {
    fs: Arc<dyn FileSystem>,
}

impl CopyTransform {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl Transform for CopyTransform {
    fn apply<'a>(&'a self, mapping: &'a AssetMapping) -> TransformFuture<'a> {
        let fs = Arc::clone(&self.fs);
        let mapping = mapping.clone();

        Box::pin(async move {
            tokio::task::spawn_blocking(move || copy_if_changed(fs.as_ref(), &mapping))
                .await
                .context("copy task did not complete")?
        })
    }
}

/// Copy `mapping.source` to `mapping.destination` unless the contents
/// already match.
pub fn copy_if_changed(fs: &dyn FileSystem, mapping: &AssetMapping) -> Result<TransformOutcome> {
    let contents = fs.read(&mapping.source)?;

    if fs.is_file(&mapping.destination) {
        let existing = compute_file_hash(fs, &mapping.destination)?;
        if existing == compute_bytes_hash(&contents) {
            debug!(%mapping, "destination content unchanged; skipping write");
            return Ok(TransformOutcome::Skipped);
        }
    }

    fs.write(&mapping.destination, &contents)?;
    debug!(%mapping, bytes = contents.len(), "copied asset");
    Ok(TransformOutcome::Written)
}
