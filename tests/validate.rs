//! Integration tests for the `validate` command.
use factopt::cli::handle_validate_command;
use factopt::log::is_logger_initialised;
use factopt::settings::Settings;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get the path to the bundled model.
fn get_model_dir() -> PathBuf {
    PathBuf::from("demos/simple")
}

/// Copy the bundled model and connect its grid to a component which does not exist
fn copy_model_with_dangling_connection(dir: &Path) {
    for entry in fs::read_dir(get_model_dir()).unwrap() {
        let path = entry.unwrap().path();
        fs::copy(&path, dir.join(path.file_name().unwrap())).unwrap();
    }

    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(dir.join("factory.toml"))
        .unwrap();
    writeln!(file, "\n[[connections]]\norigin = \"grid\"\ndestination = \"canteen\"").unwrap();
}

/// The `validate` command accepts the bundled model and rejects a broken copy of it.
///
/// Both cases share one test because the logger can only be installed once per process. We also
/// check that the logger is initialised after the first run.
#[test]
fn test_handle_validate_command() {
    unsafe { std::env::set_var("FACTOPT_LOG_LEVEL", "off") };

    assert!(!is_logger_initialised());

    handle_validate_command(&get_model_dir(), Some(Settings::default())).unwrap();

    assert!(is_logger_initialised());

    let dir = TempDir::new().unwrap();
    copy_model_with_dangling_connection(dir.path());
    let err = handle_validate_command(dir.path(), Some(Settings::default())).unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.starts_with("Failed to load model."), "{chain}");
    assert!(chain.contains("Component canteen does not exist"), "{chain}");
}
