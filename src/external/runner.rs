use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::process::Command;

/// Captured result of a finished external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Run a command to completion and capture its output.
/// Dropping the returned future kills the child, so an abandoned scan does not outlive the run.
pub async fn run_capture(cmd: &str, args: &[String]) -> Result<CommandOutput> {
    let output = Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("failed to spawn {}", cmd))?;

    Ok(CommandOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
