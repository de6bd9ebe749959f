// src/config/validate.rs

use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile, TargetConfig};
use crate::errors::{AssetpipeError, Result};
use crate::resolve::{NEGATION_MARKER, PatternList};
use crate::types::TransformKind;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::AssetpipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.target))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_targets(cfg)?;
    validate_global_config(cfg)?;
    for (name, target) in cfg.target.iter() {
        validate_target(name, target)?;
    }
    Ok(())
}

fn ensure_has_targets(cfg: &RawConfigFile) -> Result<()> {
    if cfg.target.is_empty() {
        return Err(AssetpipeError::ConfigError(
            "config must contain at least one [target.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.debounce_ms == 0 {
        return Err(AssetpipeError::ConfigError(
            "[config].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.config.concurrency == Some(0) {
        return Err(AssetpipeError::ConfigError(
            "[config].concurrency must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_target(name: &str, target: &TargetConfig) -> Result<()> {
    if target.src.is_empty() {
        return Err(AssetpipeError::ConfigError(format!(
            "target '{name}' must list at least one `src` pattern"
        )));
    }

    if target.src.iter().all(|p| p.starts_with(NEGATION_MARKER)) {
        return Err(AssetpipeError::ConfigError(format!(
            "target '{name}' has only exclusion patterns in `src`"
        )));
    }

    // Syntax only; the root is irrelevant for whether a glob compiles.
    PatternList::compile(Path::new("/"), &target.src)?;

    if target.dest.trim().is_empty() {
        return Err(AssetpipeError::ConfigError(format!(
            "target '{name}' has an empty `dest`"
        )));
    }

    if let Some(ext) = &target.ext {
        if !ext.starts_with('.') {
            return Err(AssetpipeError::ConfigError(format!(
                "target '{name}': `ext` must start with '.' (got \"{ext}\")"
            )));
        }
    }

    match (target.transform, target.cmd.as_deref()) {
        (TransformKind::Command, None) => Err(AssetpipeError::ConfigError(format!(
            "target '{name}' uses transform = \"command\" but has no `cmd`"
        ))),
        (TransformKind::Command, Some(cmd)) if cmd.trim().is_empty() => {
            Err(AssetpipeError::ConfigError(format!(
                "target '{name}' has an empty `cmd`"
            )))
        }
        (TransformKind::Copy, Some(_)) => Err(AssetpipeError::ConfigError(format!(
            "target '{name}' sets `cmd` but transform is \"copy\"; add transform = \"command\""
        ))),
        _ => Ok(()),
    }
}
