//! Test configuration helpers pointing every backend at one mock server

use lms_migrate::Config;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// A config for `base_url` with staging and ledgers inside a fresh temp dir.
/// Returns the config and the tempdir (which must be kept alive).
pub fn mock_config(base_url: &str) -> (Config, TempDir) {
    let temp_dir = TempDir::new().unwrap();

    let mut config = Config::default();
    config.working_root = temp_dir.path().join("staging");
    config.ledger.success_path = temp_dir.path().join("ledgers").join("success.csv");
    config.ledger.failure_path = temp_dir.path().join("ledgers").join("failure.csv");

    config.source.base_url = base_url.to_string();
    config.source.user_id = "admin".to_string();
    config.source.password = "secret".to_string();
    config.source.timeout = Duration::from_secs(5);

    config.target.host = base_url.to_string();
    config.target.app_id = "app".to_string();
    config.target.app_key = "appkey".to_string();
    config.target.user_id = "user".to_string();
    config.target.user_key = "userkey".to_string();
    config.target.timeout = Duration::from_secs(5);

    config.webdav.host = base_url.to_string();
    config.webdav.username = "svc".to_string();
    config.webdav.password = "svcpass".to_string();

    (config, temp_dir)
}

/// Write `config` as JSON next to the ledgers and return the file path
pub fn write_config(config: &Config, dir: &Path) -> PathBuf {
    let path = dir.join("migrate.json");
    std::fs::write(&path, serde_json::to_string_pretty(config).unwrap()).unwrap();
    path
}

/// Ledger content, or `None` if the run never created the file
pub fn read_ledger(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}
