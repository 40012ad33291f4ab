//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::file::{ConfigFile, PROJECT_FILE_NAME};
use crate::settings::{ClassifierKind, Settings};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Built-in defaults - lowest priority
/// 2. Global config (~/.texed/config.toml)
/// 3. Project config (texed.toml) - overrides global
/// 4. Environment variables (TEXED_*) - overrides project
/// 5. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Fully resolved settings
    pub settings: Settings,

    /// Project file that contributed, if any
    pub project_file: Option<PathBuf>,

    /// Whether a global config file contributed
    pub used_global: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use a specific global config path instead of ~/.texed/config.toml
    pub fn with_global_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find texed.toml, then merges the global
    /// config underneath it and environment overrides on top.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<LoadedConfig> {
        let project = self.find_project_config(start_dir)?;
        self.resolve(project)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<LoadedConfig> {
        let file = ConfigFile::load_from_file(config_path)?;
        self.resolve(Some((config_path.to_path_buf(), file)))
    }

    fn resolve(&mut self, project: Option<(PathBuf, ConfigFile)>) -> ConfigResult<LoadedConfig> {
        let mut settings = Settings::default();

        let global = self.load_global_config()?;
        let used_global = global.is_some();
        if let Some(global) = global {
            global.apply_to(&mut settings);
        }

        let project_file = match project {
            Some((path, file)) => {
                file.apply_to(&mut settings);
                Some(path)
            }
            None => None,
        };

        apply_env_overrides(&mut settings)?;
        settings.validate()?;

        Ok(LoadedConfig {
            settings,
            project_file,
            used_global,
        })
    }

    /// Find project configuration by walking up directory tree
    fn find_project_config(&self, start_dir: &Path) -> ConfigResult<Option<(PathBuf, ConfigFile)>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_FILE_NAME);

            if config_path.is_file() {
                let file = ConfigFile::load_from_file(&config_path)?;
                return Ok(Some((config_path, file)));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok(None),
            }
        }
    }

    /// Load global configuration; absence is not an error
    fn load_global_config(&mut self) -> ConfigResult<Option<ConfigFile>> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => match ConfigFile::global_config_path() {
                Ok(path) => {
                    self.global_config_path = Some(path.clone());
                    path
                }
                // No home directory means no global config
                Err(ConfigError::HomeNotFound) => return Ok(None),
                Err(e) => return Err(e),
            },
        };

        if !path.exists() {
            return Ok(None);
        }

        ConfigFile::load_from_file(&path).map(Some)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply environment variable overrides
///
/// Recognized: TEXED_COMPILER, TEXED_TIMEOUT, TEXED_CLASSIFIER, TEXED_VIEWER, TEXED_COMPRESSOR
fn apply_env_overrides(settings: &mut Settings) -> ConfigResult<()> {
    if let Ok(compiler) = env::var("TEXED_COMPILER") {
        settings.build.compiler = compiler;
    }

    if let Ok(timeout) = env::var("TEXED_TIMEOUT") {
        settings.build.timeout_secs =
            timeout
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    field: "TEXED_TIMEOUT".to_string(),
                    reason: format!("expected a number of seconds, got '{}'", timeout),
                })?;
    }

    if let Ok(classifier) = env::var("TEXED_CLASSIFIER") {
        settings.build.classifier = ClassifierKind::from_name(classifier.trim())?;
    }

    if let Ok(viewer) = env::var("TEXED_VIEWER") {
        settings.viewer.command = viewer;
    }

    if let Ok(compressor) = env::var("TEXED_COMPRESSOR") {
        settings.compress.command = compressor;
    }

    Ok(())
}
