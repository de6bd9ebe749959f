// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `assetpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetpipe",
    version,
    about = "Resolve asset globs into output paths and rebuild them on change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Its directory is the working root for all patterns and destinations.
    #[arg(long, value_name = "PATH", default_value = "Assetpipe.toml", global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run every resolved file of the given targets (all targets if none).
    Build {
        #[arg(value_name = "TARGET")]
        targets: Vec<String>,
    },
    /// Rebuild a target whenever its sources change, until Ctrl-C.
    Watch {
        #[arg(value_name = "TARGET")]
        target: String,

        /// Build the target once before waiting for changes.
        #[arg(long)]
        initial_build: bool,
    },
    /// Print each target's source -> destination mappings without running.
    List {
        #[arg(value_name = "TARGET")]
        targets: Vec<String>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
