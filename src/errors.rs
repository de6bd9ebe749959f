// src/errors.rs

//! Crate-wide error type.
//!
//! Structural problems (bad patterns, mappings escaping their root,
//! destination collisions) get their own variants so callers can match on
//! them. Per-file transform failures are *not* errors at this level; they are
//! collected into a [`RunResult`](crate::pipeline::RunResult).

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetpipeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Target not found: {0}")]
    TargetNotFound(String),

    #[error("invalid pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("path {path:?} is not inside source root {root:?}")]
    PathOutsideRoot { path: PathBuf, root: PathBuf },

    #[error(transparent)]
    Collision(#[from] CollisionError),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AssetpipeError {
    pub(crate) fn pattern(pattern: &str, reason: impl Into<String>) -> Self {
        AssetpipeError::Pattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// One destination claimed by more than one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub destination: PathBuf,
    pub sources: Vec<PathBuf>,
}

/// All destination collisions found while planning a single run.
///
/// A run produces at most one of these, however many destinations collide.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct CollisionError {
    pub collisions: Vec<Collision>,
}

impl CollisionError {
    /// Number of sources dropped from the run because of collisions.
    pub fn source_count(&self) -> usize {
        self.collisions.iter().map(|c| c.sources.len()).sum()
    }
}

impl fmt::Display for CollisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} destination collision(s):",
            self.collisions.len()
        )?;
        for c in &self.collisions {
            let sources: Vec<String> = c
                .sources
                .iter()
                .map(|s| s.display().to_string())
                .collect();
            write!(f, " {} <- [{}];", c.destination.display(), sources.join(", "))?;
        }
        Ok(())
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AssetpipeError>;
