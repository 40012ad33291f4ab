//! PDF compression through Ghostscript

use crate::error::{BuildError, BuildResult};
use crate::probe::ToolProbe;
use crate::process::run_with_timeout;
use crate::viewer::pdf_path;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use texed_config::CompressSettings;
use tokio::process::Command;
use tracing::{debug, info};

/// Temporary output written next to the PDF: `<base>_out.pdf`
pub fn output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{}_out.pdf", stem))
}

/// Arguments for the compressor, program excluded
pub fn compress_args(settings: &CompressSettings, input: &Path, output: &Path) -> Vec<OsString> {
    let mut out_flag = OsString::from("-sOutputFile=");
    out_flag.push(output.as_os_str());

    vec![
        OsString::from("-sDEVICE=pdfwrite"),
        OsString::from(format!("-dCompatibilityLevel={}", settings.compatibility_level)),
        OsString::from(format!("-dPDFSETTINGS={}", settings.pdf_settings)),
        OsString::from("-dNOPAUSE"),
        OsString::from("-dQUIET"),
        OsString::from("-dBATCH"),
        out_flag,
        input.as_os_str().to_os_string(),
    ]
}

/// Rewrite the PDF built from `source` in place with a smaller one
pub async fn compress_pdf(
    source: &Path,
    settings: &CompressSettings,
    probe: &impl ToolProbe,
) -> BuildResult<PathBuf> {
    let pdf = pdf_path(source);
    if !pdf.is_file() {
        return Err(BuildError::artifact_missing(pdf));
    }
    if !probe.is_available(&settings.command) {
        return Err(BuildError::tool_not_found(&settings.command));
    }

    let output = output_path(source);
    let original_size = fs::metadata(&pdf).map(|m| m.len()).ok();

    let mut command = Command::new(&settings.command);
    command.args(compress_args(settings, &pdf, &output));
    let run = run_with_timeout(command, &settings.command, settings.timeout()).await?;
    debug!(exit_code = ?run.exit_code, "compressor returned");

    if !output.is_file() {
        return Err(BuildError::artifact_missing(output));
    }
    fs::rename(&output, &pdf).map_err(|e| BuildError::io(&pdf, e))?;

    let compressed_size = fs::metadata(&pdf).map(|m| m.len()).ok();
    info!(
        pdf = %pdf.display(),
        before = ?original_size,
        after = ?compressed_size,
        "compressed"
    );
    Ok(pdf)
}
