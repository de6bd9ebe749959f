// src/pipeline/runner.rs

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Target;
use crate::errors::{CollisionError, Result};
use crate::fs::FileSystem;
use crate::mapping::{AssetMapping, build_mappings, partition_collisions};
use crate::resolve::{PatternList, resolve_list};

use super::result::{FailureKind, RunResult};
use super::transform::{Transform, TransformOutcome};

/// Which resolved mappings a run should hand to the transform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RunScope {
    /// Every resolved mapping.
    #[default]
    All,
    /// Only mappings whose source is in the set, or lies beneath a directory
    /// in the set; the rest count as skipped.
    Changed(BTreeSet<PathBuf>),
}

impl RunScope {
    pub fn includes(&self, source: &Path) -> bool {
        match self {
            RunScope::All => true,
            RunScope::Changed(paths) => source.ancestors().any(|p| paths.contains(p)),
        }
    }
}

/// The work a run would do, computed before any transform is invoked.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub source_root: PathBuf,
    /// Mappings safe to run, in resolution order.
    pub mappings: Vec<AssetMapping>,
    pub collision: Option<CollisionError>,
}

/// Orchestrates one pass over a target: resolve, map, check collisions,
/// then fan the mappings out to the transform and wait for all of them.
///
/// The runner itself never writes to the destination tree.
pub struct PipelineRunner {
    fs: Arc<dyn FileSystem>,
    transform: Arc<dyn Transform>,
    concurrency: usize,
}

impl fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl PipelineRunner {
    /// `concurrency` is clamped to at least 1.
    pub fn new(fs: Arc<dyn FileSystem>, transform: Arc<dyn Transform>, concurrency: usize) -> Self {
        Self {
            fs,
            transform,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Resolve and map `target` without running anything.
    ///
    /// Pattern and mapping errors are returned as errors; collisions are
    /// part of the plan.
    pub async fn plan(&self, target: &Target) -> Result<RunPlan> {
        let fs = Arc::clone(&self.fs);
        let root = target.root().to_path_buf();
        let patterns = target.source_patterns().to_vec();

        let (mut files, derived_root) = tokio::task::spawn_blocking(move || {
            let list = PatternList::compile(&root, &patterns)?;
            let files = resolve_list(fs.as_ref(), &list)?;
            Ok::<_, crate::errors::AssetpipeError>((files, list.source_root()))
        })
        .await
        .context("source resolution task did not complete")??;

        let source_root = target
            .source_root()
            .map(Path::to_path_buf)
            .unwrap_or(derived_root);

        if target.excludes_destination(&source_root) {
            let destination_root = target.destination_root();
            let dropped = files.remove_matching(|p| p.starts_with(destination_root));
            if dropped > 0 {
                debug!(
                    target_name = %target.name(),
                    dropped,
                    "ignored resolved files under the destination root"
                );
            }
        }

        let mappings = build_mappings(
            &files,
            &source_root,
            target.destination_root(),
            target.mapping(),
        )?;
        let (mappings, collision) = partition_collisions(mappings);

        debug!(
            target_name = %target.name(),
            source_root = ?source_root,
            mappings = mappings.len(),
            collisions = collision.as_ref().map_or(0, |c| c.collisions.len()),
            "planned run"
        );

        Ok(RunPlan {
            source_root,
            mappings,
            collision,
        })
    }

    /// Run every resolved mapping of `target`.
    pub async fn run(&self, target: &Target) -> Result<RunResult> {
        self.run_scoped(target, &RunScope::All).await
    }

    /// Run the mappings of `target` selected by `scope`.
    pub async fn run_scoped(&self, target: &Target, scope: &RunScope) -> Result<RunResult> {
        let started = Instant::now();
        info!(target_name = %target.name(), "starting pipeline run");

        let plan = self.plan(target).await?;
        let mut result = RunResult::new(target.name());

        if let Some(collision) = &plan.collision {
            warn!(target_name = %target.name(), %collision, "destination collision; colliding sources will not be processed");
            result.skipped += collision.source_count();
        }
        result.collision = plan.collision;

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut in_flight: Vec<(AssetMapping, JoinHandle<anyhow::Result<TransformOutcome>>)> =
            Vec::with_capacity(plan.mappings.len());

        for mapping in plan.mappings {
            if !scope.includes(&mapping.source) {
                result.skipped += 1;
                continue;
            }

            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .context("transform semaphore closed")?;
            let transform = Arc::clone(&self.transform);
            let task_mapping = mapping.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                transform.apply(&task_mapping).await
            });
            in_flight.push((mapping, handle));
        }

        // Barrier: every spawned transform settles before the result exists.
        for (mapping, handle) in in_flight {
            match handle.await {
                Ok(Ok(TransformOutcome::Written)) => result.processed += 1,
                Ok(Ok(TransformOutcome::Skipped)) => result.skipped += 1,
                Ok(Err(err)) => {
                    warn!(%mapping, error = %format!("{err:#}"), "transform failed");
                    result.record_failure(mapping, FailureKind::Transform, format!("{err:#}"));
                }
                Err(join_err) => {
                    let kind = if join_err.is_panic() {
                        FailureKind::Panicked
                    } else {
                        FailureKind::Cancelled
                    };
                    warn!(%mapping, %kind, "transform task did not complete");
                    result.record_failure(mapping, kind, join_err.to_string());
                }
            }
        }

        result.elapsed = started.elapsed();
        info!(
            target_name = %result.target,
            processed = result.processed,
            skipped = result.skipped,
            failed = result.failed,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "pipeline run finished"
        );
        Ok(result)
    }
}
