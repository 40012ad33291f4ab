pub mod build;
pub mod compress;
pub mod config;
pub mod edit;
pub mod new;
pub mod report;
pub mod view;

use crate::config::Config;
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use texed_build::{ensure_extension, BuildPipeline};
use texed_config::Settings;

/// Everything a command needs, resolved once in `main`
pub struct AppContext {
    pub settings: Settings,
    /// Directory the compiler runs in
    pub work_dir: PathBuf,
    pub env: Config,
    /// Project file that contributed to `settings`, if any
    pub project_file: Option<PathBuf>,
}

impl AppContext {
    pub fn pipeline(&self) -> BuildPipeline {
        BuildPipeline::from_settings(&self.settings, &self.work_dir)
    }
}

/// Resolve a document argument, accepting it with or without extension
pub fn resolve_source(path: &Path, settings: &Settings) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    let with_extension = ensure_extension(path, &settings.document);
    if with_extension.is_file() {
        return Ok(with_extension);
    }
    bail!("Document {} does not exist", path.display())
}
