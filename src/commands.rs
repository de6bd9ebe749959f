// src/commands.rs

//! The user-facing operations: `build`, `watch` and `list`.
//!
//! A [`Workspace`] bundles a validated config with the directory it was
//! loaded from and the filesystem to use. Every operation takes target
//! names and resolves them against that config; nothing is global.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::{ConfigFile, Target, load_and_validate};
use crate::engine::runtime::log_run_result;
use crate::engine::{RuntimeEvent, WatchCore, WatchOptions, WatchRuntime, WatchSummary};
use crate::errors::{AssetpipeError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::pipeline::{PipelineRunner, RunPlan, RunResult, transform_for_target};
use crate::watch::{ChangeFilter, WatcherHandle, spawn_watcher};

/// Capacity of the watch runtime's event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A loaded config anchored at its working root.
#[derive(Debug, Clone)]
pub struct Workspace {
    config: ConfigFile,
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
}

/// Outcome of `build` over one or more targets.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Targets that ran, in request order.
    pub results: Vec<RunResult>,
    /// Targets that could not run at all (pattern or mapping errors).
    pub errors: Vec<(String, AssetpipeError)>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.results.iter().all(RunResult::is_success)
    }
}

/// What `list` shows for one target.
#[derive(Debug, Clone)]
pub struct TargetListing {
    pub target: Target,
    pub plan: RunPlan,
}

/// Everything a watch session needs, wired up but not yet running.
#[derive(Debug)]
pub struct WatchSession {
    pub runtime: WatchRuntime,
    /// Feeds the runtime; send `ShutdownRequested` to stop it.
    pub events: mpsc::Sender<RuntimeEvent>,
    pub runner: Arc<PipelineRunner>,
    pub target: Arc<Target>,
    /// `None` when the session was prepared without a filesystem watcher.
    pub watcher: Option<WatcherHandle>,
}

impl Workspace {
    pub fn new(config: ConfigFile, root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            config,
            root: root.into(),
            fs,
        }
    }

    /// Load and validate `config_path`; its directory becomes the working root.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config = load_and_validate(config_path)?;
        let root = config_root_dir(config_path)?;
        Ok(Self::new(config, root, Arc::new(RealFileSystem)))
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn target(&self, name: &str) -> Result<Target> {
        self.config.resolve_target(name, &self.root)
    }

    /// The named targets, or every target when `names` is empty.
    pub fn targets(&self, names: &[String]) -> Result<Vec<Target>> {
        if names.is_empty() {
            return Ok(self.config.all_targets(&self.root));
        }
        names.iter().map(|name| self.target(name)).collect()
    }

    /// A runner for `target` using its configured transform.
    pub fn runner_for(&self, target: &Target) -> Result<PipelineRunner> {
        let transform = transform_for_target(target, Arc::clone(&self.fs))?;
        Ok(PipelineRunner::new(
            Arc::clone(&self.fs),
            transform,
            self.config.config.effective_concurrency(),
        ))
    }

    /// Run one full pass over a single target.
    pub async fn build_target(&self, name: &str) -> Result<RunResult> {
        let target = self.target(name)?;
        self.runner_for(&target)?.run(&target).await
    }

    /// Build each target in turn. A target that cannot run is recorded and
    /// the remaining targets still build.
    ///
    /// Unknown target names fail before anything runs.
    pub async fn build(&self, names: &[String]) -> Result<BuildReport> {
        let targets = self.targets(names)?;
        let mut report = BuildReport::default();

        for target in targets {
            let outcome = match self.runner_for(&target) {
                Ok(runner) => runner.run(&target).await,
                Err(err) => Err(err),
            };
            match outcome {
                Ok(result) => {
                    log_run_result(&result);
                    report.results.push(result);
                }
                Err(err) => {
                    warn!(target_name = %target.name(), error = %err, "target could not be built");
                    report.errors.push((target.name().to_string(), err));
                }
            }
        }

        Ok(report)
    }

    /// Resolve and map the targets without running any transform.
    pub async fn list(&self, names: &[String]) -> Result<Vec<TargetListing>> {
        let mut listings = Vec::new();
        for target in self.targets(names)? {
            let plan = self.runner_for(&target)?.plan(&target).await?;
            listings.push(TargetListing { target, plan });
        }
        Ok(listings)
    }

    /// Wire up a watch session for `name`.
    ///
    /// With `subscribe` the target's source root is watched through
    /// `notify`; without it, changes must be sent on `events` by the caller.
    pub fn prepare_watch(&self, name: &str, subscribe: bool) -> Result<WatchSession> {
        let target = Arc::new(self.target(name)?);
        let runner = Arc::new(self.runner_for(&target)?);
        let filter = ChangeFilter::for_target(&target)?;

        let (tx, rx) = mpsc::channel::<RuntimeEvent>(EVENT_CHANNEL_CAPACITY);

        let watcher = if subscribe {
            Some(spawn_watcher(filter, tx.clone())?)
        } else {
            None
        };

        let options = WatchOptions {
            debounce: self.config.config.debounce(),
        };
        let runtime = WatchRuntime::new(
            WatchCore::new(options),
            tx.clone(),
            rx,
            Arc::clone(&runner),
            Arc::clone(&target),
        )
        .incremental(self.config.config.incremental);

        Ok(WatchSession {
            runtime,
            events: tx,
            runner,
            target,
            watcher,
        })
    }

    /// Watch `name` until Ctrl-C.
    ///
    /// Setup errors (unknown target, bad patterns, subscription failure) are
    /// returned; errors of individual runs are only logged.
    pub async fn watch(&self, name: &str, initial_build: bool) -> Result<WatchSummary> {
        let session = self.prepare_watch(name, true)?;

        if initial_build {
            info!(target_name = %session.target.name(), "running initial build");
            match session.runner.run(&session.target).await {
                Ok(result) => log_run_result(&result),
                Err(err) => warn!(error = %err, "initial build failed"),
            }
        }

        // Ctrl-C -> graceful shutdown.
        {
            let tx = session.events.clone();
            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    eprintln!("failed to listen for Ctrl+C: {e}");
                    return;
                }
                let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
            });
        }

        let WatchSession {
            runtime, watcher, ..
        } = session;
        let summary = runtime.run().await?;
        drop(watcher);
        Ok(summary)
    }
}

/// Figure out the working root for a config file.
///
/// - If the config path has a non-empty parent (e.g. "web/Assetpipe.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Assetpipe.toml" (parent = ""),
///   we fall back to the current working directory.
///
/// The result is absolute so that paths reported by the OS watcher line up
/// with resolved sources.
pub fn config_root_dir(config_path: &Path) -> Result<PathBuf> {
    let dir = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok(std::path::absolute(dir)?)
}
