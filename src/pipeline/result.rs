// src/pipeline/result.rs

use std::fmt;
use std::time::Duration;

use crate::errors::CollisionError;
use crate::mapping::AssetMapping;

/// Why a single mapping failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The transform returned an error.
    Transform,
    /// The transform panicked.
    Panicked,
    /// The transform task was cancelled before finishing (runtime shutdown).
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Transform => "transform error",
            FailureKind::Panicked => "transform panicked",
            FailureKind::Cancelled => "transform cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct Failure {
    pub mapping: AssetMapping,
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of one pipeline pass over a target.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub target: String,
    /// Mappings the transform reported as written.
    pub processed: usize,
    /// Mappings left alone: unchanged content, out of scope, or dropped
    /// because their destination collided.
    pub skipped: usize,
    pub failed: usize,
    /// Per-file failures, in mapping order.
    pub failures: Vec<Failure>,
    /// Set when two or more sources mapped to the same destination.
    pub collision: Option<CollisionError>,
    pub elapsed: Duration,
}

impl RunResult {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    pub(crate) fn record_failure(
        &mut self,
        mapping: AssetMapping,
        kind: FailureKind,
        message: String,
    ) {
        self.failed += 1;
        self.failures.push(Failure {
            mapping,
            kind,
            message,
        });
    }

    /// Total number of mappings accounted for.
    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed
    }

    /// No per-file failures and no collision.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.collision.is_none()
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "target '{}': {} processed, {} skipped, {} failed in {:.2?}",
            self.target, self.processed, self.skipped, self.failed, self.elapsed
        )?;
        if let Some(collision) = &self.collision {
            write!(f, "; {collision}")?;
        }
        Ok(())
    }
}
