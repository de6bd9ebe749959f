// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RemoveKind};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::RuntimeEvent;
use crate::errors::Result;
use crate::types::ChangeKind;

use super::filter::ChangeFilter;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher on the filter's watch root and send
/// `RuntimeEvent::FileChanged` for every relevant change.
pub fn spawn_watcher(
    filter: ChangeFilter,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ObservedEvent>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                // Paths are stat'ed on notify's thread.
                if let Err(err) = event_tx.send(ObservedEvent::observe(event)) {
                    eprintln!("assetpipe: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("assetpipe: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(filter.watch_root(), RecursiveMode::Recursive)?;

    info!(root = ?filter.watch_root(), "file watcher started");

    // Ends when the watcher (and with it the sending half) is dropped.
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(kind = ?event.kind, paths = ?event.paths, "received notify event");

            for (path, state) in &event.paths {
                let Some((kind, extent)) = classify(&event.kind, *state) else {
                    continue;
                };
                let Some(change) = filter.to_change(path, kind, extent) else {
                    continue;
                };
                if runtime_tx.send(RuntimeEvent::FileChanged(change)).await.is_err() {
                    debug!("runtime gone; stopping watcher forwarding");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// What was at a reported path when its event was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathState {
    File,
    Dir,
    Missing,
}

impl PathState {
    pub fn of(path: &Path) -> Self {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_dir() => PathState::Dir,
            Ok(_) => PathState::File,
            Err(_) => PathState::Missing,
        }
    }
}

/// How much of the tree a reported change stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    /// The reported path only.
    Path,
    /// The reported path and everything that was or is beneath it.
    Tree,
}

#[derive(Debug)]
struct ObservedEvent {
    kind: EventKind,
    paths: Vec<(PathBuf, PathState)>,
}

impl ObservedEvent {
    fn observe(event: Event) -> Self {
        let paths = event
            .paths
            .into_iter()
            .map(|path| {
                let state = PathState::of(&path);
                (path, state)
            })
            .collect();
        Self {
            kind: event.kind,
            paths,
        }
    }
}

/// Map a notify event kind and the observed state of one of its paths to a
/// change.
///
/// Access events are dropped, as are creations and content changes on
/// directories (their files report their own events). A rename reports both
/// ends, so each end is classified by whether it exists afterwards. A
/// directory renamed or removed as a whole arrives as a single event, which
/// is returned with [`Extent::Tree`].
pub fn classify(kind: &EventKind, state: PathState) -> Option<(ChangeKind, Extent)> {
    match (kind, state) {
        (EventKind::Access(_), _) => None,
        (EventKind::Modify(ModifyKind::Name(_)), PathState::Dir) => {
            Some((ChangeKind::Created, Extent::Tree))
        }
        (EventKind::Modify(ModifyKind::Name(_)), PathState::File) => {
            Some((ChangeKind::Created, Extent::Path))
        }
        (EventKind::Modify(ModifyKind::Name(_)), PathState::Missing) => {
            Some((ChangeKind::Deleted, Extent::Tree))
        }
        (EventKind::Remove(RemoveKind::File), _) => Some((ChangeKind::Deleted, Extent::Path)),
        (EventKind::Remove(_), _) => Some((ChangeKind::Deleted, Extent::Tree)),
        (_, PathState::Dir) => None,
        (EventKind::Create(_), _) => Some((ChangeKind::Created, Extent::Path)),
        (EventKind::Modify(_) | EventKind::Any | EventKind::Other, _) => {
            Some((ChangeKind::Modified, Extent::Path))
        }
    }
}
