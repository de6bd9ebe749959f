// src/lib.rs

pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod mapping;
pub mod paths;
pub mod pipeline;
pub mod resolve;
pub mod types;
pub mod watch;

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use crate::cli::{CliArgs, Command};
use crate::commands::{BuildReport, TargetListing, Workspace};

/// High-level entry point used by `main.rs`.
///
/// Returns `Ok(false)` when the command ran but did not succeed (a build
/// with failures or collisions); errors are setup problems.
pub async fn run(args: CliArgs) -> Result<bool> {
    let config_path = PathBuf::from(&args.config);
    let workspace = Workspace::load(&config_path)?;
    info!(root = ?workspace.root(), config = ?config_path, "loaded config");

    match args.command {
        Command::Build { targets } => {
            let report = workspace.build(&targets).await?;
            print_build_report(&report);
            Ok(report.is_success())
        }
        Command::Watch {
            target,
            initial_build,
        } => {
            let summary = workspace.watch(&target, initial_build).await?;
            info!(?summary, "watch finished");
            Ok(true)
        }
        Command::List { targets } => {
            let listings = workspace.list(&targets).await?;
            print_listings(&listings);
            Ok(true)
        }
    }
}

/// Per-target summary on stdout, aggregated problems on stderr.
fn print_build_report(report: &BuildReport) {
    for result in &report.results {
        println!("{result}");
        for failure in &result.failures {
            eprintln!(
                "[assetpipe] {}: {} ({}): {}",
                result.target, failure.mapping, failure.kind, failure.message
            );
        }
        if let Some(collision) = &result.collision {
            eprintln!("[assetpipe] {}: {collision}", result.target);
        }
    }
    for (target, err) in &report.errors {
        eprintln!("[assetpipe] {target}: {err}");
    }
}

fn print_listings(listings: &[TargetListing]) {
    for listing in listings {
        println!(
            "{} ({} file(s), source root {})",
            listing.target.name(),
            listing.plan.mappings.len(),
            listing.plan.source_root.display()
        );
        for mapping in &listing.plan.mappings {
            println!("  {mapping}");
        }
        if let Some(collision) = &listing.plan.collision {
            println!("  ! {collision}");
        }
    }
}
