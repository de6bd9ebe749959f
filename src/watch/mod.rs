// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Wiring up a cross-platform filesystem watcher (`notify`) on a
//!   target's source root.
//! - Filtering raw events through the target's ordered pattern list.
//!
//! It does **not** debounce or run anything; it only turns filesystem
//! changes into `RuntimeEvent::FileChanged` for the engine.

pub mod filter;
pub mod watcher;

pub use filter::ChangeFilter;
pub use watcher::{Extent, PathState, WatcherHandle, classify, spawn_watcher};
