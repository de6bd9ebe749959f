// src/pipeline/command.rs

//! Per-file shell command transform.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::{debug, info};

use crate::mapping::AssetMapping;

use super::transform::{Transform, TransformFuture, TransformOutcome};

/// Runs a shell command template once per mapping.
///
/// Placeholders: `{src}` (source path), `{dest}` (destination path) and
/// `{name}` (source file name). Substituted paths are shell-quoted. The
/// destination's parent directory is created before the command runs.
#[derive(Debug, Clone)]
pub struct CommandTransform {
    template: String,
    cwd: PathBuf,
}

impl CommandTransform {
    pub fn new(template: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            cwd: cwd.into(),
        }
    }

    /// The command line that will run for `mapping`.
    pub fn render(&self, mapping: &AssetMapping) -> String {
        let name = mapping
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.template
            .replace("{src}", &shell_quote(&mapping.source))
            .replace("{dest}", &shell_quote(&mapping.destination))
            .replace("{name}", &quote_str(&name))
    }
}

impl Transform for CommandTransform {
    fn apply<'a>(&'a self, mapping: &'a AssetMapping) -> TransformFuture<'a> {
        Box::pin(run_command(self.render(mapping), &self.cwd, mapping))
    }
}

async fn run_command(
    command_line: String,
    cwd: &Path,
    mapping: &AssetMapping,
) -> Result<TransformOutcome> {
    if let Some(parent) = mapping.destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating output directory {:?}", parent))?;
    }

    info!(cmd = %command_line, source = ?mapping.source, "running transform command");

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&command_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&command_line);
        c
    };

    cmd.current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = cmd
        .output()
        .await
        .with_context(|| format!("spawning transform command `{command_line}`"))?;

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        debug!(source = ?mapping.source, "stdout: {}", line);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines() {
        debug!(source = ?mapping.source, "stderr: {}", line);
    }

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let last_line = stderr.lines().last().unwrap_or("").trim();
        if last_line.is_empty() {
            bail!("command exited with code {code}");
        }
        bail!("command exited with code {code}: {last_line}");
    }

    Ok(TransformOutcome::Written)
}

fn shell_quote(path: &Path) -> String {
    quote_str(&path.to_string_lossy())
}

fn quote_str(s: &str) -> String {
    if cfg!(windows) {
        format!("\"{}\"", s.replace('"', "\\\""))
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}
