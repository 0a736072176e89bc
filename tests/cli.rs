//! Exit codes of the lms-migrate binary

mod common;

use common::*;
use std::process::Command;
use tempfile::TempDir;

fn lms_migrate() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_lms-migrate"));
    command.env_remove("LMS_MIGRATE_CONFIG");
    command.env("RUST_LOG", "off");
    command
}

#[test]
fn test_missing_config_exits_with_config_code() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("courses.csv");
    std::fs::write(&input, "guid,ouid\nG1,O1\n").unwrap();

    let status = lms_migrate()
        .arg("--config")
        .arg(dir.path().join("missing.json"))
        .arg(&input)
        .status()
        .unwrap();

    assert_eq!(status.code(), Some(2));
}

#[test]
fn test_incomplete_config_exits_with_config_code() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("migrate.json");
    std::fs::write(&config, r#"{"source": {"base_url": "http://127.0.0.1:9"}}"#).unwrap();
    let input = dir.path().join("courses.csv");
    std::fs::write(&input, "guid,ouid\nG1,O1\n").unwrap();

    let output = lms_migrate().arg("--config").arg(&config).arg(&input).output().unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("source.user_id"));
}

#[test]
fn test_malformed_header_exits_with_fatal_code() {
    let (config, temp_dir) = mock_config("http://127.0.0.1:9");
    let success = config.ledger.success_path.clone();
    let config_path = write_config(&config, temp_dir.path());
    let input = temp_dir.path().join("courses.csv");
    std::fs::write(&input, "guid,org\nG1,O1\n").unwrap();

    let output = lms_migrate()
        .arg("--config")
        .arg(&config_path)
        .arg(&input)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ouid"));
    assert_eq!(read_ledger(&success), None);
}
