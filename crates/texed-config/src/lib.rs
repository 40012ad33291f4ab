//! texed Configuration System
//!
//! Provides configuration for the texed editor and its build pipeline:
//! - Resolved settings consumed by the build crate ([`Settings`])
//! - Configuration files (`~/.texed/config.toml` and `texed.toml`)
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Global config (~/.texed/config.toml)
//! 3. Project config (texed.toml, searched upwards from the working directory)
//! 4. Environment variables (TEXED_*)
//! 5. CLI flags (applied by the caller)
//!
//! # Example
//!
//! ```no_run
//! use texed_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let loaded = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("compiler: {}", loaded.settings.build.compiler);
//! ```

pub mod file;
pub mod loader;
pub mod settings;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use file::ConfigFile;
pub use loader::{ConfigLoader, LoadedConfig};
pub use settings::{
    BuildSettings, ClassifierKind, CompressSettings, DocumentSettings, Settings, ViewerSettings,
};
