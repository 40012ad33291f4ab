//! Build command - compile one document to PDF

use super::{report, resolve_source, AppContext};
use anyhow::{Context, Result};
use std::path::PathBuf;
use texed_build::{open_pdf, PathProbe};
use tokio::runtime::Runtime;

/// Build command arguments
pub struct BuildArgs {
    /// Document to build
    pub file: PathBuf,
    /// JSON output
    pub json: bool,
    /// Open the PDF afterwards
    pub view: bool,
}

/// Run the build command
pub fn run(ctx: &AppContext, runtime: &Runtime, args: BuildArgs) -> Result<()> {
    let source = resolve_source(&args.file, &ctx.settings)?;
    let pipeline = ctx.pipeline();

    let result = runtime.block_on(pipeline.compile_saved(&source));

    if args.json {
        let value = report::to_json(&result);
        println!("{}", serde_json::to_string_pretty(&value)?);
    }

    let success = result.with_context(|| format!("Failed to build {}", source.display()))?;
    if !args.json {
        report::print_success(&success);
    }

    if args.view {
        runtime
            .block_on(open_pdf(&success.source, &ctx.settings.viewer, &PathProbe))
            .context("Failed to open the PDF")?;
    }

    Ok(())
}
