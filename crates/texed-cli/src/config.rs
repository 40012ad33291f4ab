//! CLI configuration via environment variables
//!
//! Build settings come from `texed-config`; this covers only presentation
//! and session preferences.

use std::env;
use std::path::PathBuf;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Default to JSON build reports (TEXED_JSON=1)
    pub default_json: bool,
    /// Disable colored output (TEXED_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
    /// Custom history file path (TEXED_HISTORY_FILE=/path/to/file)
    pub history_file: Option<PathBuf>,
    /// Disable session history (TEXED_NO_HISTORY=1)
    pub no_history: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            default_json: env::var("TEXED_JSON")
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            no_color: env::var("TEXED_NO_COLOR").is_ok() || env::var("NO_COLOR").is_ok(),
            history_file: env::var("TEXED_HISTORY_FILE").ok().map(PathBuf::from),
            no_history: env::var("TEXED_NO_HISTORY").is_ok(),
        }
    }

    /// Get the history file path
    ///
    /// Returns:
    /// 1. TEXED_HISTORY_FILE if set
    /// 2. ~/.texed/history if home directory exists
    /// 3. None otherwise
    pub fn get_history_path(&self) -> Option<PathBuf> {
        if let Some(ref path) = self.history_file {
            return Some(path.clone());
        }
        dirs::home_dir().map(|home| home.join(".texed").join("history"))
    }
}

fn is_truthy(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    !(lower.is_empty() || lower == "0" || lower == "false" || lower == "off")
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear() {
        for var in [
            "TEXED_JSON",
            "TEXED_NO_COLOR",
            "NO_COLOR",
            "TEXED_HISTORY_FILE",
            "TEXED_NO_HISTORY",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear();
        let config = Config::from_env();
        assert!(!config.default_json);
        assert!(!config.no_color);
        assert!(config.history_file.is_none());
        assert!(!config.no_history);
    }

    #[test]
    #[serial]
    fn test_config_json() {
        clear();
        env::set_var("TEXED_JSON", "1");
        assert!(Config::from_env().default_json);
        env::set_var("TEXED_JSON", "off");
        assert!(!Config::from_env().default_json);
        env::remove_var("TEXED_JSON");
    }

    #[test]
    #[serial]
    fn test_config_no_color() {
        clear();
        env::set_var("TEXED_NO_COLOR", "1");
        assert!(Config::from_env().no_color);
        env::remove_var("TEXED_NO_COLOR");

        // Also test NO_COLOR (standard)
        env::set_var("NO_COLOR", "1");
        assert!(Config::from_env().no_color);
        env::remove_var("NO_COLOR");
    }

    #[test]
    #[serial]
    fn test_get_history_path_custom() {
        clear();
        env::set_var("TEXED_HISTORY_FILE", "/tmp/texed_history");
        let config = Config::from_env();
        assert_eq!(
            config.get_history_path(),
            Some(PathBuf::from("/tmp/texed_history"))
        );
        env::remove_var("TEXED_HISTORY_FILE");
    }

    #[test]
    #[serial]
    fn test_config_no_history() {
        clear();
        env::set_var("TEXED_NO_HISTORY", "1");
        assert!(Config::from_env().no_history);
        env::remove_var("TEXED_NO_HISTORY");
    }
}
