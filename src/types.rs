// src/types.rs

use std::str::FromStr;
use serde::Deserialize;

/// Which built-in transform a target uses.
///
/// - `Copy`: copy each source to its destination, skipping files whose
///   content is already identical (default).
/// - `Command`: run the target's `cmd` template once per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    #[default]
    Copy,
    Command,
}

impl FromStr for TransformKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "copy" => Ok(TransformKind::Copy),
            "command" => Ok(TransformKind::Command),
            other => Err(format!(
                "invalid transform: {other} (expected \"copy\" or \"command\")"
            )),
        }
    }
}

/// What happened to a watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

impl ChangeKind {
    /// Whether the path still exists as a source after this change.
    pub fn is_present(self) -> bool {
        !matches!(self, ChangeKind::Deleted)
    }
}
