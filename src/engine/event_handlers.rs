// src/engine/event_handlers.rs

//! Event handling logic for the watch core.
//!
//! Each handler receives the pieces of core state it touches and returns
//! the commands the IO shell has to carry out. Nothing here sleeps, spawns
//! or reads the clock.

use std::time::Duration;

use tracing::debug;

use crate::engine::{ChangeBatch, FileChange, RunOutcome, WatchState};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start a timer that reports `DebounceElapsed { generation }` after
    /// `delay`. Earlier timers become stale.
    ArmDebounce { generation: u64, delay: Duration },
    /// Start one pipeline run for these changes.
    StartRun(ChangeBatch),
    /// Request that the watch loop exits.
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn none() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }

    fn with(command: CoreCommand) -> Self {
        Self {
            commands: vec![command],
            keep_running: true,
        }
    }

    fn exit() -> Self {
        Self {
            commands: vec![CoreCommand::RequestExit],
            keep_running: false,
        }
    }
}

/// Generation-counted debounce window.
///
/// Re-arming bumps the generation, which is how the window is reset
/// without cancelling the previous timer.
#[derive(Debug, Clone)]
pub struct DebounceClock {
    generation: u64,
    delay: Duration,
}

impl DebounceClock {
    pub fn new(delay: Duration) -> Self {
        Self {
            generation: 0,
            delay,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn arm(&mut self) -> CoreCommand {
        self.generation += 1;
        CoreCommand::ArmDebounce {
            generation: self.generation,
            delay: self.delay,
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }
}

/// Handle a filtered file change.
///
/// - Idle: start the debounce window.
/// - Debouncing: reset the window.
/// - Running: remember the change for a follow-up run.
pub fn handle_file_changed(
    state: &mut WatchState,
    pending: &mut ChangeBatch,
    clock: &mut DebounceClock,
    stop_requested: bool,
    change: FileChange,
) -> CoreStep {
    if *state == WatchState::Stopped || stop_requested {
        return CoreStep::none();
    }

    pending.record(change);

    match *state {
        WatchState::Idle | WatchState::Debouncing => {
            *state = WatchState::Debouncing;
            CoreStep::with(clock.arm())
        }
        WatchState::Running | WatchState::RunningWithPendingChanges => {
            *state = WatchState::RunningWithPendingChanges;
            CoreStep::none()
        }
        WatchState::Stopped => CoreStep::none(),
    }
}

/// Handle an expired debounce timer.
///
/// Only the most recently armed timer starts a run; older ones are stale
/// because the window has been reset since.
pub fn handle_debounce_elapsed(
    state: &mut WatchState,
    pending: &mut ChangeBatch,
    clock: &DebounceClock,
    generation: u64,
) -> CoreStep {
    if *state != WatchState::Debouncing {
        return CoreStep::none();
    }
    if !clock.is_current(generation) {
        debug!(generation, current = clock.generation(), "ignoring stale debounce timer");
        return CoreStep::none();
    }
    if pending.is_empty() {
        *state = WatchState::Idle;
        return CoreStep::none();
    }

    *state = WatchState::Running;
    CoreStep::with(CoreCommand::StartRun(pending.take()))
}

/// Handle the end of the in-flight run.
///
/// Changes that arrived during the run open a fresh debounce window rather
/// than starting immediately, so a burst that straddles the end of a run
/// still collapses into one follow-up.
pub fn handle_run_completed(
    state: &mut WatchState,
    pending: &mut ChangeBatch,
    clock: &mut DebounceClock,
    stop_requested: bool,
    outcome: &RunOutcome,
) -> CoreStep {
    debug!(?outcome, ?state, "run completed");

    if stop_requested {
        pending.take();
        *state = WatchState::Stopped;
        return CoreStep::exit();
    }

    match *state {
        WatchState::RunningWithPendingChanges => {
            *state = WatchState::Debouncing;
            CoreStep::with(clock.arm())
        }
        WatchState::Running => {
            *state = WatchState::Idle;
            CoreStep::none()
        }
        // A completion without a run in flight is ignored.
        _ => CoreStep::none(),
    }
}

/// Handle a stop request.
///
/// Without a run in flight the pending batch is discarded and the loop
/// exits right away. With a run in flight the stop is deferred until the
/// run completes.
pub fn handle_shutdown(
    state: &mut WatchState,
    pending: &mut ChangeBatch,
    stop_requested: &mut bool,
) -> CoreStep {
    match *state {
        WatchState::Idle | WatchState::Debouncing | WatchState::Stopped => {
            if !pending.is_empty() {
                debug!(discarded = pending.len(), "discarding pending changes on stop");
            }
            pending.take();
            *state = WatchState::Stopped;
            CoreStep::exit()
        }
        WatchState::Running | WatchState::RunningWithPendingChanges => {
            *stop_requested = true;
            CoreStep::none()
        }
    }
}
