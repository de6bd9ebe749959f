// src/engine/core.rs

//! Pure core watch state machine.
//!
//! This module contains a synchronous, deterministic "core" that consumes
//! [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::WatchRuntime`) is responsible for:
//! - reading events from channels
//! - arming debounce timers
//! - spawning pipeline runs
//!
//! The core is intended to be extensively unit tested without any Tokio,
//! channels, filesystem, or processes.

use crate::engine::event_handlers::{
    CoreStep, DebounceClock, handle_debounce_elapsed, handle_file_changed, handle_run_completed,
    handle_shutdown,
};
use crate::engine::{ChangeBatch, RuntimeEvent, WatchOptions, WatchState};

/// Pure core state for one watched target.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct WatchCore {
    state: WatchState,
    pending: ChangeBatch,
    clock: DebounceClock,
    stop_requested: bool,
}

impl WatchCore {
    pub fn new(options: WatchOptions) -> Self {
        Self {
            state: WatchState::Idle,
            pending: ChangeBatch::new(),
            clock: DebounceClock::new(options.debounce),
            stop_requested: false,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Number of distinct paths waiting for the next run.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Generation of the most recently armed debounce timer.
    pub fn debounce_generation(&self) -> u64 {
        self.clock.generation()
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        let step = match event {
            RuntimeEvent::FileChanged(change) => handle_file_changed(
                &mut self.state,
                &mut self.pending,
                &mut self.clock,
                self.stop_requested,
                change,
            ),
            RuntimeEvent::DebounceElapsed { generation } => {
                handle_debounce_elapsed(&mut self.state, &mut self.pending, &self.clock, generation)
            }
            RuntimeEvent::RunCompleted { outcome } => handle_run_completed(
                &mut self.state,
                &mut self.pending,
                &mut self.clock,
                self.stop_requested,
                &outcome,
            ),
            RuntimeEvent::ShutdownRequested => {
                handle_shutdown(&mut self.state, &mut self.pending, &mut self.stop_requested)
            }
        };

        if self.state == WatchState::Stopped {
            return CoreStep {
                keep_running: false,
                ..step
            };
        }
        step
    }
}
