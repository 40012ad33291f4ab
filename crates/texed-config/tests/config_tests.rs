//! Configuration loading tests

use pretty_assertions::assert_eq;
use rstest::rstest;
use serial_test::serial;
use std::fs;
use tempfile::TempDir;
use texed_config::{ClassifierKind, ConfigError, ConfigFile, ConfigLoader, Settings};

fn loader_without_global(dir: &TempDir) -> ConfigLoader {
    ConfigLoader::new().with_global_path(dir.path().join("absent.toml"))
}

#[rstest]
#[case("markers", ClassifierKind::Markers)]
#[case("exit-code", ClassifierKind::ExitCode)]
#[case("exitcode", ClassifierKind::ExitCode)]
fn test_classifier_aliases(#[case] name: &str, #[case] expected: ClassifierKind) {
    assert_eq!(ClassifierKind::from_name(name).unwrap(), expected);
}

#[rstest]
#[case("[build]\ntimeout_secs = 0\n")]
#[case("[compress]\ntimeout_secs = 0\n")]
#[case("[build]\ncompiler = \"\"\n")]
#[case("[document]\naccepted_extensions = []\n")]
#[case("[document]\ndefault_extension = \"md\"\n")]
#[serial]
fn test_invalid_project_files(#[case] content: &str) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("texed.toml"), content).unwrap();

    let result = loader_without_global(&dir).load_from_directory(dir.path());
    assert!(
        matches!(result, Err(ConfigError::InvalidValue { .. })),
        "expected validation failure for {:?}",
        content
    );
}

#[test]
#[serial]
fn test_resolved_settings_serialize_back_to_a_loadable_file() {
    let dir = TempDir::new().unwrap();
    let text = Settings::default().to_toml().unwrap();
    let path = dir.path().join("texed.toml");
    fs::write(&path, &text).unwrap();

    let file = ConfigFile::load_from_file(&path).unwrap();
    let mut settings = Settings::default();
    file.apply_to(&mut settings);
    assert_eq!(settings, Settings::default());
}

#[test]
#[serial]
fn test_malformed_toml_reports_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("texed.toml");
    fs::write(&path, "[build\ncompiler = 1").unwrap();

    let err = loader_without_global(&dir)
        .load_from_directory(dir.path())
        .unwrap_err();
    match err {
        ConfigError::TomlParseError { file, .. } => assert_eq!(file, path),
        other => panic!("unexpected error: {}", other),
    }
}
