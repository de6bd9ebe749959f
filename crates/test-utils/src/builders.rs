#![allow(dead_code)]

use std::collections::BTreeMap;

use assetpipe::config::{ConfigFile, ConfigSection, RawConfigFile, TargetConfig};
use assetpipe::types::TransformKind;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                target: BTreeMap::new(),
            },
        }
    }

    pub fn with_target(mut self, name: &str, target: TargetConfig) -> Self {
        self.config.target.insert(name.to_string(), target);
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.config.debounce_ms = ms;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.config.concurrency = Some(n);
        self
    }

    pub fn incremental(mut self, val: bool) -> Self {
        self.config.config.incremental = val;
        self
    }

    /// The unvalidated form, for exercising validation errors.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TargetConfig`.
pub struct TargetConfigBuilder {
    target: TargetConfig,
}

impl TargetConfigBuilder {
    pub fn new(dest: &str) -> Self {
        Self {
            target: TargetConfig {
                src: Vec::new(),
                dest: dest.to_string(),
                source_root: None,
                flatten: false,
                ext: None,
                transform: TransformKind::Copy,
                cmd: None,
            },
        }
    }

    pub fn src(mut self, pattern: &str) -> Self {
        self.target.src.push(pattern.to_string());
        self
    }

    pub fn source_root(mut self, dir: &str) -> Self {
        self.target.source_root = Some(dir.to_string());
        self
    }

    pub fn flatten(mut self) -> Self {
        self.target.flatten = true;
        self
    }

    pub fn ext(mut self, ext: &str) -> Self {
        self.target.ext = Some(ext.to_string());
        self
    }

    pub fn command(mut self, cmd: &str) -> Self {
        self.target.transform = TransformKind::Command;
        self.target.cmd = Some(cmd.to_string());
        self
    }

    pub fn build(self) -> TargetConfig {
        self.target
    }
}
