// src/config/mod.rs

//! Configuration loading and validation for assetpipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate targets and global settings (`validate.rs`).
//! - Turn a target section into an immutable [`Target`] (`target.rs`).

pub mod loader;
pub mod model;
pub mod target;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, TargetConfig};
pub use target::Target;
