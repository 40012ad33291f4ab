//! Resolved settings
//!
//! Every field here has a concrete value. Configuration files only carry
//! overrides (see [`crate::file`]); the loader folds them into these structs.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete editor configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Settings {
    pub build: BuildSettings,
    pub viewer: ViewerSettings,
    pub compress: CompressSettings,
    pub document: DocumentSettings,
}

/// Compiler invocation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildSettings {
    /// Compiler executable (name on PATH or explicit path)
    pub compiler: String,
    /// Flags passed before the document path
    pub args: Vec<String>,
    /// Per-invocation timeout in seconds
    pub timeout_secs: u64,
    /// How compiler output is judged
    pub classifier: ClassifierKind,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            compiler: "pdflatex".to_string(),
            args: vec![
                "-synctex=1".to_string(),
                "-interaction=nonstopmode".to_string(),
            ],
            timeout_secs: 10,
            classifier: ClassifierKind::Markers,
        }
    }
}

impl BuildSettings {
    /// Timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Outcome classification strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierKind {
    /// Scan output text for failure markers (pdflatex does not report failure reliably)
    #[default]
    Markers,
    /// Trust the compiler's exit status
    ExitCode,
}

impl ClassifierKind {
    /// Get classifier name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Markers => "markers",
            Self::ExitCode => "exit-code",
        }
    }

    /// Parse classifier from its configuration name
    pub fn from_name(name: &str) -> ConfigResult<Self> {
        match name {
            "markers" => Ok(Self::Markers),
            "exit-code" | "exitcode" => Ok(Self::ExitCode),
            _ => Err(ConfigError::InvalidValue {
                field: "build.classifier".to_string(),
                reason: format!("must be 'markers' or 'exit-code', got '{}'", name),
            }),
        }
    }
}

/// PDF viewer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewerSettings {
    pub command: String,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            command: "xdg-open".to_string(),
        }
    }
}

/// Ghostscript compression settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompressSettings {
    pub command: String,
    /// Value for `-dCompatibilityLevel`
    pub compatibility_level: String,
    /// Value for `-dPDFSETTINGS`
    pub pdf_settings: String,
    pub timeout_secs: u64,
}

impl Default for CompressSettings {
    fn default() -> Self {
        Self {
            command: "gs".to_string(),
            compatibility_level: "1.4".to_string(),
            pdf_settings: "/printer".to_string(),
            timeout_secs: 120,
        }
    }
}

impl CompressSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Document file naming rules
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentSettings {
    /// Extension appended to paths without an accepted one
    pub default_extension: String,
    /// Extensions a document path may already carry
    pub accepted_extensions: Vec<String>,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            default_extension: "tex".to_string(),
            accepted_extensions: vec!["tex".to_string(), "sty".to_string()],
        }
    }
}

impl DocumentSettings {
    /// Check whether `ext` (without the dot) is accepted
    pub fn accepts(&self, ext: &str) -> bool {
        self.accepted_extensions.iter().any(|e| e == ext)
    }
}

impl Settings {
    /// Validate resolved settings
    pub fn validate(&self) -> ConfigResult<()> {
        if self.build.compiler.trim().is_empty() {
            return Err(invalid("build.compiler", "cannot be empty"));
        }
        if self.build.timeout_secs == 0 {
            return Err(invalid("build.timeout_secs", "must be greater than zero"));
        }
        if self.viewer.command.trim().is_empty() {
            return Err(invalid("viewer.command", "cannot be empty"));
        }
        if self.compress.command.trim().is_empty() {
            return Err(invalid("compress.command", "cannot be empty"));
        }
        if self.compress.timeout_secs == 0 {
            return Err(invalid("compress.timeout_secs", "must be greater than zero"));
        }
        if self.document.accepted_extensions.is_empty() {
            return Err(invalid(
                "document.accepted_extensions",
                "at least one extension is required",
            ));
        }
        if let Some(ext) = self
            .document
            .accepted_extensions
            .iter()
            .find(|e| e.is_empty() || e.starts_with('.'))
        {
            return Err(ConfigError::InvalidValue {
                field: "document.accepted_extensions".to_string(),
                reason: format!("'{}' must be a bare extension like \"tex\"", ext),
            });
        }
        if !self.document.accepts(&self.document.default_extension) {
            return Err(ConfigError::InvalidValue {
                field: "document.default_extension".to_string(),
                reason: format!(
                    "'{}' is not listed in document.accepted_extensions",
                    self.document.default_extension
                ),
            });
        }
        Ok(())
    }

    /// Render settings as TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
