//! New command - create a document from the built-in template

use super::AppContext;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use texed_build::{ensure_extension, Document, Template};

/// New command arguments
pub struct NewArgs {
    pub path: PathBuf,
    pub template: Template,
    /// Overwrite an existing file
    pub force: bool,
}

pub fn run(ctx: &AppContext, args: NewArgs) -> Result<()> {
    let path = create(&args.path, &args.template, args.force, ctx)?;
    println!(
        "{} {} ({})",
        "Created".green().bold(),
        path.display(),
        args.template.class
    );
    Ok(())
}

/// Write the rendered template, returning the final path
pub fn create(path: &Path, template: &Template, force: bool, ctx: &AppContext) -> Result<PathBuf> {
    let target = ensure_extension(path, &ctx.settings.document);
    if target.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            target.display()
        );
    }

    let mut document = Document::with_text(template.render());
    document
        .save_as(&target, &ctx.settings.document)
        .with_context(|| format!("Failed to create {}", target.display()))
}
