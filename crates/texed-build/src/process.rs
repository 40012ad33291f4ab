//! Child process execution with a bounded wait

use crate::error::{BuildError, BuildResult};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Captured result of one external tool run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
}

impl ToolOutput {
    /// Stdout followed by stderr
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text
    }
}

/// Run `command` to completion, killing it if `timeout` elapses first
///
/// Stdin is closed and both output streams are captured. The child is
/// spawned with `kill_on_drop`, so abandoning the wait terminates it.
pub async fn run_with_timeout(
    mut command: Command,
    tool: &str,
    timeout: Duration,
) -> BuildResult<ToolOutput> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(?command, timeout_secs = timeout.as_secs(), "spawning");
    let start = Instant::now();

    let child = command.spawn().map_err(|e| BuildError::Spawn {
        tool: tool.to_string(),
        error: e,
    })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| BuildError::Spawn {
            tool: tool.to_string(),
            error: e,
        })?,
        Err(_) => {
            return Err(BuildError::Timeout {
                tool: tool.to_string(),
                timeout,
            })
        }
    };

    let elapsed = start.elapsed();
    debug!(
        tool,
        exit_code = ?output.status.code(),
        elapsed_ms = elapsed.as_millis() as u64,
        "finished"
    );

    Ok(ToolOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code(),
        elapsed,
    })
}
