//! Config command - print the resolved settings

use super::AppContext;
use anyhow::{Context, Result};

pub fn run(ctx: &AppContext) -> Result<()> {
    let toml = ctx
        .settings
        .to_toml()
        .context("Failed to serialize settings")?;

    match &ctx.project_file {
        Some(path) => println!("# project file: {}", path.display()),
        None => println!("# project file: none"),
    }
    println!("# work dir: {}", ctx.work_dir.display());
    println!();
    print!("{}", toml);
    Ok(())
}
