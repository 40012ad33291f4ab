//! Compress command - shrink the built PDF with Ghostscript

use super::{resolve_source, AppContext};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use texed_build::{compress_pdf, pdf_path, PathProbe};
use tokio::runtime::Runtime;

pub fn run(ctx: &AppContext, runtime: &Runtime, file: &Path) -> Result<()> {
    let source = resolve_source(file, &ctx.settings)?;
    let before = file_size(&pdf_path(&source));

    let pdf = runtime
        .block_on(compress_pdf(&source, &ctx.settings.compress, &PathProbe))
        .with_context(|| format!("Failed to compress {}", pdf_path(&source).display()))?;

    match (before, file_size(&pdf)) {
        (Some(before), Some(after)) => println!(
            "{} {} ({} -> {} bytes)",
            "Compressed".green().bold(),
            pdf.display(),
            before,
            after
        ),
        _ => println!("{} {}", "Compressed".green().bold(), pdf.display()),
    }
    Ok(())
}

fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).map(|m| m.len()).ok()
}
