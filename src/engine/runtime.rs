// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::Target;
use crate::errors::Result;
use crate::pipeline::{PipelineRunner, RunResult, RunScope};

use super::core::WatchCore;
use super::{ChangeBatch, CoreCommand, RunOutcome, RuntimeEvent};

/// Counters reported when the watch loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub changes_seen: usize,
    pub runs_started: usize,
    pub runs_failed: usize,
}

/// Drives the watch core in response to `RuntimeEvent`s and performs the
/// side effects it asks for: arming debounce timers and spawning runs.
///
/// All watch semantics live in [`WatchCore`]; this struct only handles
/// async IO.
pub struct WatchRuntime {
    core: WatchCore,
    event_tx: mpsc::Sender<RuntimeEvent>,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    runner: Arc<PipelineRunner>,
    target: Arc<Target>,
    incremental: bool,
    summary: WatchSummary,
}

impl fmt::Debug for WatchRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRuntime")
            .field("core", &self.core)
            .field("target", &self.target.name())
            .field("incremental", &self.incremental)
            .finish_non_exhaustive()
    }
}

impl WatchRuntime {
    /// `event_tx` must feed `event_rx`; the runtime keeps a clone to report
    /// timer expiries and run completions back to itself.
    pub fn new(
        core: WatchCore,
        event_tx: mpsc::Sender<RuntimeEvent>,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        runner: Arc<PipelineRunner>,
        target: Arc<Target>,
    ) -> Self {
        Self {
            core,
            event_tx,
            event_rx,
            runner,
            target,
            incremental: false,
            summary: WatchSummary::default(),
        }
    }

    /// Limit each run to the created and modified paths of its batch.
    pub fn incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    /// Main event loop. Returns once the core stops.
    pub async fn run(mut self) -> Result<WatchSummary> {
        info!(target_name = %self.target.name(), "watch runtime started");

        loop {
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };

            debug!(?event, "runtime received event");

            match &event {
                RuntimeEvent::FileChanged(_) => self.summary.changes_seen += 1,
                RuntimeEvent::RunCompleted { outcome } if !outcome.is_success() => {
                    self.summary.runs_failed += 1
                }
                _ => {}
            }

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command);
            }

            if !step.keep_running {
                info!("core requested exit; stopping watch runtime");
                break;
            }
        }

        info!(
            changes = self.summary.changes_seen,
            runs = self.summary.runs_started,
            failed_runs = self.summary.runs_failed,
            "watch runtime exiting"
        );
        Ok(self.summary)
    }

    fn execute_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::ArmDebounce { generation, delay } => {
                let tx = self.event_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    // The loop may already have exited.
                    let _ = tx.send(RuntimeEvent::DebounceElapsed { generation }).await;
                });
            }
            CoreCommand::StartRun(batch) => self.start_run(batch),
            CoreCommand::RequestExit => {
                info!("core issued RequestExit command");
            }
        }
    }

    fn start_run(&mut self, batch: ChangeBatch) {
        self.summary.runs_started += 1;
        let scope = if self.incremental {
            RunScope::Changed(batch.present_paths())
        } else {
            RunScope::All
        };
        info!(
            target_name = %self.target.name(),
            changes = batch.len(),
            incremental = self.incremental,
            "starting triggered run"
        );

        let runner = Arc::clone(&self.runner);
        let target = Arc::clone(&self.target);
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let run = tokio::spawn(async move { runner.run_scoped(&target, &scope).await });

            // The completion event is sent whatever happened to the run, so
            // the core never stays in `Running`.
            let outcome = match run.await {
                Ok(Ok(result)) => {
                    log_run_result(&result);
                    outcome_of(&result)
                }
                Ok(Err(err)) => {
                    error!(error = %err, "triggered run failed");
                    RunOutcome::Errored(err.to_string())
                }
                Err(join_err) => {
                    error!(error = %join_err, "triggered run did not complete");
                    RunOutcome::Errored(join_err.to_string())
                }
            };
            let _ = tx.send(RuntimeEvent::RunCompleted { outcome }).await;
        });
    }
}

fn outcome_of(result: &RunResult) -> RunOutcome {
    if result.is_success() {
        RunOutcome::Succeeded
    } else {
        RunOutcome::Failed {
            failed: result.failed,
            collision: result.collision.is_some(),
        }
    }
}

/// Log a finished run at a level matching its outcome.
pub fn log_run_result(result: &RunResult) {
    if result.is_success() {
        info!("{result}");
        return;
    }
    warn!("{result}");
    for failure in &result.failures {
        warn!(mapping = %failure.mapping, kind = %failure.kind, "{}", failure.message);
    }
}
