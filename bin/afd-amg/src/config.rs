//! TOML configuration for the directory-scanner process.

use std::path::PathBuf;
use std::time::Duration;

use afd_core::directory::{DeleteFlags, Directory, Recipient};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("could not parse {path:?}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

#[derive(Debug, Deserialize)]
pub struct RecipientConfig {
    pub host_alias: String,
    pub target_path: String,
}

#[derive(Debug, Deserialize)]
pub struct DirectoryConfig {
    pub id: u32,
    pub path: PathBuf,
    #[serde(default = "default_old_file_time_secs")]
    pub old_file_time_secs: u64,
    #[serde(default)]
    pub delete_unknown: bool,
    #[serde(default)]
    pub delete_queued: bool,
    #[serde(default)]
    pub delete_locked: bool,
    #[serde(default = "default_max_copied_files")]
    pub max_copied_files: u32,
    #[serde(default = "default_max_copied_bytes")]
    pub max_copied_bytes: u64,
    #[serde(default)]
    pub recipients: Vec<RecipientConfig>,
}

const fn default_old_file_time_secs() -> u64 {
    3600
}

const fn default_max_copied_files() -> u32 {
    1000
}

const fn default_max_copied_bytes() -> u64 {
    1 << 30
}

impl DirectoryConfig {
    #[must_use]
    pub fn into_directory(self) -> Directory {
        let mut flags = DeleteFlags::none();
        if self.delete_unknown {
            flags = flags.union(DeleteFlags::UNKNOWN);
        }
        if self.delete_queued {
            flags = flags.union(DeleteFlags::QUEUED);
        }
        if self.delete_locked {
            flags = flags.union(DeleteFlags::LOCKED);
        }
        Directory {
            id: self.id,
            path: self.path,
            old_file_time: Duration::from_secs(self.old_file_time_secs),
            delete_flags: flags,
            max_copied_files: self.max_copied_files,
            max_copied_bytes: self.max_copied_bytes,
            recipients: self
                .recipients
                .into_iter()
                .map(|r| Recipient { host_alias: r.host_alias, target_path: r.target_path })
                .collect(),
            disabled: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AmgConfig {
    pub pool_root: PathBuf,
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    #[serde(default)]
    pub directories: Vec<DirectoryConfig>,
}

const fn default_scan_interval_secs() -> u64 {
    5
}

impl AmgConfig {
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}
