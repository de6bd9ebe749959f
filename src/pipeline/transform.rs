// src/pipeline/transform.rs

//! Pluggable per-file transform.
//!
//! The runner hands each [`AssetMapping`] to a `Transform` and only records
//! the outcome; all writing happens inside the transform.
//!
//! - [`CopyTransform`](super::copy::CopyTransform) and
//!   [`CommandTransform`](super::command::CommandTransform) are the built-in
//!   implementations selected by a target's `transform` setting.
//! - [`FnTransform`] adapts a plain closure, which is what library callers
//!   and tests usually want.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;

use crate::config::Target;
use crate::fs::FileSystem;
use crate::mapping::AssetMapping;
use crate::types::TransformKind;

use super::command::CommandTransform;
use super::copy::CopyTransform;

/// What a transform did with one mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformOutcome {
    Written,
    /// Nothing to do, e.g. the destination was already up to date.
    Skipped,
}

pub type TransformFuture<'a> = Pin<Box<dyn Future<Output = Result<TransformOutcome>> + Send + 'a>>;

/// Trait abstracting how a single asset is converted and written.
pub trait Transform: Send + Sync {
    /// Convert `mapping.source` into `mapping.destination`.
    ///
    /// Errors are per-file failures; they never abort the run.
    fn apply<'a>(&'a self, mapping: &'a AssetMapping) -> TransformFuture<'a>;
}

/// Synchronous closure as a transform.
pub struct FnTransform<F> {
    f: F,
}

impl<F> FnTransform<F>
where
    F: Fn(&AssetMapping) -> Result<TransformOutcome> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(&AssetMapping) -> Result<TransformOutcome> + Send + Sync,
{
    fn apply<'a>(&'a self, mapping: &'a AssetMapping) -> TransformFuture<'a> {
        Box::pin(async move { (self.f)(mapping) })
    }
}

/// Build the transform configured for `target`.
pub fn transform_for_target(
    target: &Target,
    fs: Arc<dyn FileSystem>,
) -> crate::errors::Result<Arc<dyn Transform>> {
    match (target.transform(), target.cmd()) {
        (TransformKind::Copy, _) => Ok(Arc::new(CopyTransform::new(fs))),
        (TransformKind::Command, Some(cmd)) => {
            Ok(Arc::new(CommandTransform::new(cmd, target.root())))
        }
        (TransformKind::Command, None) => Err(crate::errors::AssetpipeError::ConfigError(format!(
            "target '{}' uses transform = \"command\" but has no `cmd`",
            target.name()
        ))),
    }
}
