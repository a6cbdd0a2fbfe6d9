//! Process settings for sitevault
//!
//! Settings are stored as a single JSON file (default `/etc/sitevault.json`,
//! overridable with `--config` or `SITEVAULT_CONFIG`). They are loaded once
//! at process start and never mutated during a run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{VaultError, VaultResult};

/// Default location of the settings file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sitevault.json";

/// Where encrypted backups are replicated to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// Keep generations on the local filesystem only
    #[default]
    Local,
    /// Replicate to an S3-compatible object store
    S3,
    /// Replicate to an FTP server
    Ftp,
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Local => write!(f, "local"),
            Destination::S3 => write!(f, "s3"),
            Destination::Ftp => write!(f, "ftp"),
        }
    }
}

impl std::str::FromStr for Destination {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Destination::Local),
            "s3" => Ok(Destination::S3),
            "ftp" => Ok(Destination::Ftp),
            other => Err(VaultError::Config(format!(
                "Unknown destination '{}': expected local, s3 or ftp",
                other
            ))),
        }
    }
}

/// Website file tree to back up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSettings {
    /// Root of the website file tree (e.g. /var/www/html)
    pub path: PathBuf,
}

/// MySQL database to dump and restore
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database server host
    #[serde(default = "default_db_host")]
    pub host: String,
    /// Database name (also names the dump artifact)
    pub name: String,
    /// Database user
    pub user: String,
    /// Database password (passed via MYSQL_PWD, never on argv)
    pub password: String,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

/// S3 destination credentials and endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Settings {
    /// Bucket holding the generation prefixes
    pub bucket: String,
    /// Region name (e.g. eu-west-3)
    pub region: String,
    /// Custom endpoint for S3-compatible stores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
}

/// FTP destination credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FtpSettings {
    /// Server address, host or host:port (port 21 assumed when absent)
    pub server: String,
    pub user: String,
    pub password: String,
    /// Remote directory holding the generation directories
    pub root_path: String,
    /// Use passive mode
    #[serde(default)]
    pub passive: bool,
}

/// Top-level settings for sitevault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Number of daily generations retained per store (must be >= 2)
    #[serde(default = "default_retention_depth")]
    pub retention_depth: u32,

    /// Remote replication target
    #[serde(default)]
    pub destination: Destination,

    /// Root directory of the local retention tree
    pub local_root: PathBuf,

    /// Path to the 256-bit key file
    pub key_file: PathBuf,

    pub site: SiteSettings,
    pub database: DatabaseSettings,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Settings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ftp: Option<FtpSettings>,
}

fn default_retention_depth() -> u32 {
    3
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load(path: &Path) -> VaultResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            VaultError::Config(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;

        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| VaultError::Config(format!("Failed to parse settings file: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Pre-flight validation of the loaded settings
    pub fn validate(&self) -> VaultResult<()> {
        if self.retention_depth < 2 {
            return Err(VaultError::Config(format!(
                "retention_depth must be at least 2, got {}",
                self.retention_depth
            )));
        }

        match self.destination {
            Destination::S3 if self.s3.is_none() => Err(VaultError::Config(
                "destination is 's3' but the [s3] section is missing".into(),
            )),
            Destination::Ftp if self.ftp.is_none() => Err(VaultError::Config(
                "destination is 'ftp' but the [ftp] section is missing".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: &Path) -> VaultResult<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| VaultError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| VaultError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
