// src/engine/mod.rs

//! Watch-mode orchestration.
//!
//! This module ties together:
//! - the change batch that coalesces filesystem events per path
//! - the debounce window
//! - the run lifecycle (at most one pipeline run in flight per target)
//!
//! The pure core state machine lives in [`core`]; the async/IO shell that
//! owns timers and spawns runs is implemented in [`runtime`].

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::ChangeKind;

/// A single filesystem change that passed the target's filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl FileChange {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Changes accumulated since the last run was started, one entry per path.
///
/// A later change to the same path replaces the earlier kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    changes: BTreeMap<PathBuf, ChangeKind>,
}

impl ChangeBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, change: FileChange) {
        self.changes.insert(change.path, change.kind);
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn kind_of(&self, path: &Path) -> Option<ChangeKind> {
        self.changes.get(path).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, ChangeKind)> {
        self.changes.iter().map(|(p, k)| (p.as_path(), *k))
    }

    /// Paths that still exist after the batch (created or modified).
    pub fn present_paths(&self) -> BTreeSet<PathBuf> {
        self.changes
            .iter()
            .filter(|(_, kind)| kind.is_present())
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Move everything out, leaving the batch empty.
    pub fn take(&mut self) -> ChangeBatch {
        std::mem::take(self)
    }
}

/// Lifecycle state of a watched target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// No pending changes and no run in flight.
    Idle,
    /// Changes are pending; waiting for the debounce window to pass quietly.
    Debouncing,
    /// A run is in flight and nothing new has arrived since it started.
    Running,
    /// A run is in flight and more changes arrived after it started.
    RunningWithPendingChanges,
    Stopped,
}

/// How a triggered run ended, as seen by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    /// The run finished but reported per-file failures or a collision.
    Failed { failed: usize, collision: bool },
    /// The run could not be carried out (pattern error, mapping error, panic).
    Errored(String),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded)
    }
}

/// Options shared by the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    /// Quiet period required after the last change before a run starts.
    pub debounce: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
        }
    }
}

/// Events flowing into the runtime from the watcher, timers and run tasks.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A relevant file was created, modified or deleted.
    FileChanged(FileChange),
    /// A debounce timer armed with `generation` expired.
    DebounceElapsed { generation: u64 },
    /// The in-flight run finished.
    RunCompleted { outcome: RunOutcome },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use self::core::WatchCore;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::{WatchRuntime, WatchSummary};
