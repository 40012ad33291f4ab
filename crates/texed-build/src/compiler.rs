//! Compilation invoker

use crate::error::BuildResult;
use crate::process::{run_with_timeout, ToolOutput};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;
use texed_config::BuildSettings;
use tokio::process::Command;
use tracing::debug;

/// Captured compiler run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    /// Stdout followed by stderr
    pub text: String,
    pub exit_code: Option<i32>,
}

impl From<ToolOutput> for CompileOutput {
    fn from(output: ToolOutput) -> Self {
        Self {
            text: output.combined(),
            exit_code: output.exit_code,
        }
    }
}

/// Runs the document compiler once
#[async_trait]
pub trait Compiler: Send + Sync {
    /// Executable name, used for probing and messages
    fn program(&self) -> &str;

    /// Compile `source` with `work_dir` as the process working directory
    async fn compile(&self, source: &Path, work_dir: &Path) -> BuildResult<CompileOutput>;
}

/// Spawns the configured compiler as a child process
#[derive(Debug, Clone)]
pub struct ProcessCompiler {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessCompiler {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_settings(settings: &BuildSettings) -> Self {
        Self::new(
            settings.compiler.clone(),
            settings.args.clone(),
            settings.timeout(),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full argument vector for `source`, program first
    pub fn command_line(&self, source: &Path) -> Vec<OsString> {
        let mut line = Vec::with_capacity(self.args.len() + 2);
        line.push(OsString::from(&self.program));
        line.extend(self.args.iter().map(OsString::from));
        line.push(source.as_os_str().to_os_string());
        line
    }
}

#[async_trait]
impl Compiler for ProcessCompiler {
    fn program(&self) -> &str {
        &self.program
    }

    async fn compile(&self, source: &Path, work_dir: &Path) -> BuildResult<CompileOutput> {
        let line = self.command_line(source);
        debug!(?line, work_dir = %work_dir.display(), "spawning compiler");

        let mut parts = line.into_iter();
        let program = parts.next().unwrap_or_else(|| OsString::from(&self.program));
        let mut command = Command::new(program);
        command.args(parts).current_dir(work_dir);

        let output = run_with_timeout(command, &self.program, self.timeout).await?;
        Ok(output.into())
    }
}
