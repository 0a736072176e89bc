//! Configuration types for lms-migrate
//!
//! A [`Config`] is built once (usually from a JSON file) and handed to the
//! [`BatchRunner`](crate::migration::BatchRunner) and the client constructors.
//! Nothing in the pipeline reads configuration from ambient state.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Main configuration for a migration run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Root of the local staging area; attachments land in `{working_root}/{guid}/{name}`
    /// (default: "./staging")
    #[serde(default = "default_working_root")]
    pub working_root: PathBuf,

    /// Field delimiter for the batch input and both ledgers (default: ',')
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Output ledger locations
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Sakai (source system) settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Brightspace (target system) settings
    #[serde(default)]
    pub target: TargetConfig,

    /// Brightspace WebDAV storage settings
    #[serde(default)]
    pub webdav: WebDavConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_root: default_working_root(),
            delimiter: default_delimiter(),
            ledger: LedgerConfig::default(),
            source: SourceConfig::default(),
            target: TargetConfig::default(),
            webdav: WebDavConfig::default(),
        }
    }
}

/// Success and failure ledger paths
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Rows that migrated cleanly (default: "./success.csv")
    #[serde(default = "default_success_path")]
    pub success_path: PathBuf,

    /// Rows that failed and should be re-run (default: "./failure.csv")
    #[serde(default = "default_failure_path")]
    pub failure_path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            success_path: default_success_path(),
            failure_path: default_failure_path(),
        }
    }
}

/// Sakai connection settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the Sakai instance, e.g. "https://sakai.example.edu"
    #[serde(default)]
    pub base_url: String,

    /// Login user id
    #[serde(default)]
    pub user_id: String,

    /// Login password
    #[serde(default)]
    pub password: String,

    /// HTTP request timeout in seconds (default: 60)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            user_id: String::new(),
            password: String::new(),
            timeout: default_timeout(),
        }
    }
}

/// Brightspace Valence settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Base URL of the Brightspace instance, e.g. "https://lms.example.edu"
    #[serde(default)]
    pub host: String,

    /// Application id issued by the key tool
    #[serde(default)]
    pub app_id: String,

    /// Application key issued by the key tool
    #[serde(default)]
    pub app_key: String,

    /// User id of the migrating account
    #[serde(default)]
    pub user_id: String,

    /// User key of the migrating account
    #[serde(default)]
    pub user_key: String,

    /// Learning-environment API version (default: "1.74")
    #[serde(default = "default_le_version")]
    pub le_version: String,

    /// Learning-platform API version (default: "1.47")
    #[serde(default = "default_lp_version")]
    pub lp_version: String,

    /// Call `whoami` before processing any row and abort the run if it fails (default: false)
    #[serde(default)]
    pub verify_on_start: bool,

    /// HTTP request timeout in seconds (default: 60)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            app_id: String::new(),
            app_key: String::new(),
            user_id: String::new(),
            user_key: String::new(),
            le_version: default_le_version(),
            lp_version: default_lp_version(),
            verify_on_start: false,
            timeout: default_timeout(),
        }
    }
}

/// WebDAV storage and service account used for uploads and attachment linking
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebDavConfig {
    /// WebDAV host, e.g. "https://lms.example.edu"
    #[serde(default)]
    pub host: String,

    /// Root folder under the host (default: "content/enforced")
    #[serde(default = "default_dav_root")]
    pub root: String,

    /// Service account user name (basic auth)
    #[serde(default)]
    pub username: String,

    /// Service account password (basic auth)
    #[serde(default)]
    pub password: String,

    /// Valence user id of the service account; the main user pair is used when unset
    #[serde(default)]
    pub service_user_id: Option<String>,

    /// Valence user key of the service account
    #[serde(default)]
    pub service_user_key: Option<String>,
}

impl Default for WebDavConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            root: default_dav_root(),
            username: String::new(),
            password: String::new(),
            service_user_id: None,
            service_user_key: None,
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read config file '{}': {}", path.display(), e),
            key: None,
        })?;
        serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("cannot parse config file '{}': {}", path.display(), e),
            key: None,
        })
    }

    /// Check that every setting the HTTP clients need is present
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("source.base_url", &self.source.base_url),
            ("source.user_id", &self.source.user_id),
            ("source.password", &self.source.password),
            ("target.host", &self.target.host),
            ("target.app_id", &self.target.app_id),
            ("target.app_key", &self.target.app_key),
            ("target.user_id", &self.target.user_id),
            ("target.user_key", &self.target.user_key),
            ("webdav.host", &self.webdav.host),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config {
                    message: format!("{key} must be set"),
                    key: Some(key.to_string()),
                });
            }
        }

        if self.webdav.service_user_id.is_some() != self.webdav.service_user_key.is_some() {
            return Err(Error::Config {
                message: "webdav.service_user_id and webdav.service_user_key must be set together"
                    .to_string(),
                key: Some("webdav.service_user_id".to_string()),
            });
        }

        self.delimiter_byte()?;

        Ok(())
    }

    /// Delimiter as the single byte the delimited-text reader expects
    ///
    /// # Errors
    /// Returns [`Error::Config`] for a non-ASCII delimiter, a quote or a line break
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter {
            '"' | '\n' | '\r' => {}
            c if c.is_ascii() => return Ok(c as u8),
            _ => {}
        }
        Err(Error::Config {
            message: format!("unsupported delimiter {:?}", self.delimiter),
            key: Some("delimiter".to_string()),
        })
    }
}

fn default_working_root() -> PathBuf {
    PathBuf::from("staging")
}

fn default_delimiter() -> char {
    ','
}

fn default_success_path() -> PathBuf {
    PathBuf::from("success.csv")
}

fn default_failure_path() -> PathBuf {
    PathBuf::from("failure.csv")
}

fn default_le_version() -> String {
    "1.74".to_string()
}

fn default_lp_version() -> String {
    "1.47".to_string()
}

fn default_dav_root() -> String {
    "content/enforced".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

// Duration serialization helper (seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
