// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::types::TransformKind;

/// Configuration exactly as read from the TOML file, before validation.
///
/// ```toml
/// [config]
/// debounce_ms = 100
/// concurrency = 8
///
/// [target.scripts]
/// src = ["lib/**/*.js", "!lib/vendor/**"]
/// dest = "dist"
/// ```
///
/// All sections are optional at this stage; [`ConfigFile`] is the validated
/// form the rest of the crate consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All targets from `[target.<name>]`, keyed by target name.
    #[serde(default)]
    pub target: BTreeMap<String, TargetConfig>,
}

/// Validated configuration. Only obtainable through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    target: BTreeMap<String, TargetConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        target: BTreeMap<String, TargetConfig>,
    ) -> Self {
        Self { config, target }
    }

    pub fn targets(&self) -> &BTreeMap<String, TargetConfig> {
        &self.target
    }

    pub fn target(&self, name: &str) -> Option<&TargetConfig> {
        self.target.get(name)
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Quiet period after the last change event before a watch run starts.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Maximum number of transforms in flight during a run.
    ///
    /// If `None`, the available parallelism of the machine is used.
    #[serde(default)]
    pub concurrency: Option<usize>,

    /// If true, runs triggered by the watcher only transform the sources
    /// that changed in the batch instead of every resolved file.
    #[serde(default)]
    pub incremental: bool,
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            concurrency: None,
            incremental: false,
        }
    }
}

impl ConfigSection {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Effective transform fan-out.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }
}

/// `[target.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Ordered source patterns; entries starting with `!` exclude.
    pub src: Vec<String>,

    /// Destination root, relative to the config file's directory.
    pub dest: String,

    /// Explicit source root. If `None`, the common base directory of the
    /// include patterns is used.
    #[serde(default)]
    pub source_root: Option<String>,

    /// Write every output directly under `dest`, dropping subdirectories.
    #[serde(default)]
    pub flatten: bool,

    /// Replacement extension for outputs, e.g. `".min.js"`.
    #[serde(default)]
    pub ext: Option<String>,

    #[serde(default)]
    pub transform: TransformKind,

    /// Command template for `transform = "command"`. `{src}`, `{dest}` and
    /// `{name}` are substituted per file.
    #[serde(default)]
    pub cmd: Option<String>,
}
