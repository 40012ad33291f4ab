//! Opening the built PDF

use crate::error::{BuildError, BuildResult};
use crate::probe::ToolProbe;
use crate::process::run_with_timeout;
use std::path::{Path, PathBuf};
use std::time::Duration;
use texed_config::ViewerSettings;
use tokio::process::Command;
use tracing::debug;

/// Upper bound on waiting for the viewer launcher to return
pub const VIEWER_TIMEOUT: Duration = Duration::from_secs(30);

/// PDF produced for `source`: same directory and base name
pub fn pdf_path(source: &Path) -> PathBuf {
    source.with_extension("pdf")
}

/// Hand the PDF built from `source` to the configured viewer
///
/// The viewer's output is discarded. Returns the PDF path that was opened.
pub async fn open_pdf(
    source: &Path,
    settings: &ViewerSettings,
    probe: &impl ToolProbe,
) -> BuildResult<PathBuf> {
    let pdf = pdf_path(source);
    if !pdf.is_file() {
        return Err(BuildError::artifact_missing(pdf));
    }
    if !probe.is_available(&settings.command) {
        return Err(BuildError::tool_not_found(&settings.command));
    }

    let mut command = Command::new(&settings.command);
    command.arg(&pdf);
    let output = run_with_timeout(command, &settings.command, VIEWER_TIMEOUT).await?;
    debug!(pdf = %pdf.display(), exit_code = ?output.exit_code, "viewer returned");

    Ok(pdf)
}
