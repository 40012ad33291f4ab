/// Build pipeline error types
use crate::diagnostics::Diagnostics;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("'{tool}' was not found on this system. Please install it and try again.")]
    ToolNotFound { tool: String },

    #[error("'{tool}' did not finish within {}s", .timeout.as_secs())]
    Timeout { tool: String, timeout: Duration },

    #[error("The document was not created: {}", failure_summary(.0))]
    CompilationFailed(Diagnostics),

    #[error("Expected file {path} does not exist (build the document first)")]
    ArtifactMissing { path: PathBuf },

    #[error("Failed to start '{tool}': {error}")]
    Spawn {
        tool: String,
        error: std::io::Error,
    },

    #[error("I/O error at {path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("The current document has no file name. Save it first.")]
    Unsaved,

    #[error("A build of {path} is already running")]
    AlreadyRunning { path: PathBuf },

    #[error("Cannot use {path} as a document: {reason}")]
    InvalidDocument { path: PathBuf, reason: String },

    #[error("The build of {path} stopped before reporting a result")]
    Aborted { path: PathBuf },
}

fn failure_summary(diagnostics: &Diagnostics) -> String {
    match diagnostics.error_count() {
        0 if diagnostics.log_missing() => "compiler log not found".to_string(),
        0 => "no diagnostics in compiler log".to_string(),
        1 => "1 error".to_string(),
        n => format!("{} errors", n),
    }
}

impl BuildError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }

    /// Create a tool-not-found error
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create an artifact-missing error
    pub fn artifact_missing(path: impl Into<PathBuf>) -> Self {
        Self::ArtifactMissing { path: path.into() }
    }

    /// Diagnostics attached to a compilation failure
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::CompilationFailed(diagnostics) => Some(diagnostics),
            _ => None,
        }
    }

    /// Short machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ToolNotFound { .. } => "tool-not-found",
            Self::Timeout { .. } => "timeout",
            Self::CompilationFailed(_) => "compilation-failed",
            Self::ArtifactMissing { .. } => "artifact-missing",
            Self::Spawn { .. } => "spawn",
            Self::Io { .. } => "io",
            Self::Unsaved => "unsaved",
            Self::AlreadyRunning { .. } => "already-running",
            Self::InvalidDocument { .. } => "invalid-document",
            Self::Aborted { .. } => "aborted",
        }
    }

    /// The single message shown to the user for this failure
    ///
    /// Compilation failures carry the reformatted log diagnostics; everything
    /// else is a one-line advisory.
    pub fn user_message(&self) -> String {
        match self {
            Self::CompilationFailed(diagnostics) => diagnostics.to_plain_text(),
            Self::Timeout { .. } => format!("Time limit exceeded: {}", self),
            other => other.to_string(),
        }
    }
}
