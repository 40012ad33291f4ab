//! Configuration files (`~/.texed/config.toml`, `texed.toml`)
//!
//! Both files share one schema: every section and key is optional and only
//! overrides what a lower layer already set.

use crate::settings::{ClassifierKind, Settings};
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration file name
pub const PROJECT_FILE_NAME: &str = "texed.toml";

/// One configuration file on disk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer: Option<ViewerSection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub compress: Option<CompressSection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentSection>,
}

/// `[build]` overrides
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<ClassifierKind>,
}

/// `[viewer]` overrides
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ViewerSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// `[compress]` overrides
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct CompressSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility_level: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_settings: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// `[document]` overrides
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DocumentSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_extension: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_extensions: Option<Vec<String>>,
}

impl ConfigFile {
    /// Load a configuration file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        Self::parse(&content, path)
    }

    /// Parse configuration text; `origin` is only used in error messages
    pub fn parse(content: &str, origin: &Path) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
            file: origin.to_path_buf(),
            error: e,
        })
    }

    /// Get the global config file path (~/.texed/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".texed").join("config.toml"))
    }

    /// Fold this file's overrides into `settings`
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(build) = &self.build {
            if let Some(compiler) = &build.compiler {
                settings.build.compiler = compiler.clone();
            }
            if let Some(args) = &build.args {
                settings.build.args = args.clone();
            }
            if let Some(timeout) = build.timeout_secs {
                settings.build.timeout_secs = timeout;
            }
            if let Some(classifier) = build.classifier {
                settings.build.classifier = classifier;
            }
        }

        if let Some(viewer) = &self.viewer {
            if let Some(command) = &viewer.command {
                settings.viewer.command = command.clone();
            }
        }

        if let Some(compress) = &self.compress {
            if let Some(command) = &compress.command {
                settings.compress.command = command.clone();
            }
            if let Some(level) = &compress.compatibility_level {
                settings.compress.compatibility_level = level.clone();
            }
            if let Some(pdf_settings) = &compress.pdf_settings {
                settings.compress.pdf_settings = pdf_settings.clone();
            }
            if let Some(timeout) = compress.timeout_secs {
                settings.compress.timeout_secs = timeout;
            }
        }

        if let Some(document) = &self.document {
            if let Some(ext) = &document.default_extension {
                settings.document.default_extension = ext.clone();
            }
            if let Some(exts) = &document.accepted_extensions {
                settings.document.accepted_extensions = exts.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_file() {
        let file = ConfigFile::parse("", Path::new("texed.toml")).unwrap();
        assert_eq!(file, ConfigFile::default());
    }

    #[test]
    fn test_parse_full_file() {
        let toml = r#"
[build]
compiler = "lualatex"
args = ["-interaction=nonstopmode"]
timeout_secs = 30
classifier = "exit-code"

[viewer]
command = "zathura"

[compress]
command = "gswin64c"
compatibility_level = "1.5"
pdf_settings = "/ebook"
timeout_secs = 300

[document]
default_extension = "tex"
accepted_extensions = ["tex", "ltx"]
"#;

        let file = ConfigFile::parse(toml, Path::new("texed.toml")).unwrap();
        let mut settings = Settings::default();
        file.apply_to(&mut settings);

        assert_eq!(settings.build.compiler, "lualatex");
        assert_eq!(settings.build.args, vec!["-interaction=nonstopmode"]);
        assert_eq!(settings.build.timeout_secs, 30);
        assert_eq!(settings.build.classifier, ClassifierKind::ExitCode);
        assert_eq!(settings.viewer.command, "zathura");
        assert_eq!(settings.compress.pdf_settings, "/ebook");
        assert_eq!(settings.compress.timeout_secs, 300);
        assert_eq!(settings.document.accepted_extensions, vec!["tex", "ltx"]);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = r#"
[build]
compilr = "pdflatex"
"#;
        let err = ConfigFile::parse(toml, Path::new("texed.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParseError { .. }));
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let toml = r#"
[build]
timeout_secs = 60
"#;
        let file = ConfigFile::parse(toml, Path::new("texed.toml")).unwrap();
        let mut settings = Settings::default();
        file.apply_to(&mut settings);

        assert_eq!(settings.build.timeout_secs, 60);
        assert_eq!(settings.build.compiler, "pdflatex");
        assert_eq!(settings.viewer.command, "xdg-open");
    }
}
