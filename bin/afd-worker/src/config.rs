//! TOML configuration for one transfer-worker invocation: the host it
//! connects to, and the local paths it needs alongside the job it was
//! handed.

use std::num::NonZeroU64;
use std::path::PathBuf;
use std::time::Duration;

use afd_core::host::{FileSizeOffset, Host, HostOptions, HostStatus};
use afd_core::job::{LockPolicy, Scheme};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("could not parse {path:?}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeConfig {
    #[default]
    Ftp,
    FtpsControl,
    FtpsBoth,
    Scp,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockPolicyConfig {
    #[default]
    None,
    Dot,
    DotVms,
    Postfix,
    LockFile,
    Unique,
    Sequence,
}

#[derive(Debug, Deserialize)]
pub struct WorkerConfig {
    pub alias: String,
    pub hostname: String,
    #[serde(default)]
    pub hostname_alt: Option<String>,
    #[serde(default)]
    pub scheme: SchemeConfig,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    #[serde(default)]
    pub proxy_script: Option<String>,
    #[serde(default = "default_allowed_transfers")]
    pub allowed_transfers: u8,
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    #[serde(default = "default_transfer_timeout_secs")]
    pub transfer_timeout_secs: u64,
    #[serde(default)]
    pub transfer_rate_limit: Option<u64>,
    #[serde(default)]
    pub lock_policy: LockPolicyConfig,
    #[serde(default)]
    pub lock_file_name: Option<String>,
    #[serde(default = "default_keep_alive")]
    pub keep_alive: bool,
    pub append_dir: PathBuf,
    #[serde(default = "default_lock_suffix")]
    pub lock_suffix: String,
    #[serde(default)]
    pub archive_root: Option<PathBuf>,
}

const fn default_port() -> u16 {
    21
}

const fn default_allowed_transfers() -> u8 {
    1
}

const fn default_block_size() -> usize {
    32 * 1024
}

const fn default_transfer_timeout_secs() -> u64 {
    120
}

const fn default_keep_alive() -> bool {
    false
}

fn default_lock_suffix() -> String {
    ".lck".to_string()
}

impl WorkerConfig {
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    #[must_use]
    pub fn to_host(&self) -> Host {
        let scheme = match self.scheme {
            SchemeConfig::Ftp => Scheme::Ftp,
            SchemeConfig::FtpsControl => Scheme::FtpsControl,
            SchemeConfig::FtpsBoth => Scheme::FtpsBoth,
            SchemeConfig::Scp => Scheme::Scp,
        };
        let lock_policy = match self.lock_policy {
            LockPolicyConfig::None => LockPolicy::None,
            LockPolicyConfig::Dot => LockPolicy::Dot,
            LockPolicyConfig::DotVms => LockPolicy::DotVms,
            LockPolicyConfig::Postfix => LockPolicy::Postfix,
            LockPolicyConfig::LockFile => LockPolicy::LockFile,
            LockPolicyConfig::Unique => LockPolicy::Unique,
            LockPolicyConfig::Sequence => LockPolicy::Sequence,
        };
        let mut options = HostOptions::none();
        if self.keep_alive {
            options = options.union(HostOptions::KEEP_ALIVE);
        }
        Host {
            alias: self.alias.clone(),
            hostnames: (self.hostname.clone(), self.hostname_alt.clone()),
            current_toggle: 1,
            scheme,
            port: self.port,
            user: self.user.clone(),
            proxy_script: self.proxy_script.clone(),
            allowed_transfers: self.allowed_transfers,
            active_transfers: 0,
            max_errors: 5,
            retry_interval: Duration::from_secs(60),
            block_size: self.block_size,
            file_size_offset: FileSizeOffset::Auto,
            transfer_rate_limit: self.transfer_rate_limit.and_then(NonZeroU64::new),
            options,
            rename_file_busy: Some('~'),
            lock_policy,
            lock_file_name: self.lock_file_name.clone(),
            burst_limit: 0,
            transfer_timeout: Duration::from_secs(self.transfer_timeout_secs),
            error_history: afd_core::host::ErrorHistory::default(),
            error_counter: 0,
            status: HostStatus::none(),
        }
    }
}
