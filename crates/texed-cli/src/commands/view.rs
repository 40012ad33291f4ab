//! View command - open the built PDF

use super::{resolve_source, AppContext};
use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use texed_build::{open_pdf, PathProbe};
use tokio::runtime::Runtime;

pub fn run(ctx: &AppContext, runtime: &Runtime, file: &Path) -> Result<()> {
    let source = resolve_source(file, &ctx.settings)?;
    let pdf = runtime.block_on(open_pdf(&source, &ctx.settings.viewer, &PathProbe))?;
    println!("{} {}", "Opened".green().bold(), pdf.display());
    Ok(())
}
