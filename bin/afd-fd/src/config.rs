//! TOML configuration for the job-dispatcher process: one entry per host.

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

#[derive(Debug, Deserialize)]
pub struct HostConfig {
    pub alias: String,
    pub hostname: String,
    #[serde(default)]
    pub hostname_alt: Option<String>,
    #[serde(default)]
    pub scheme: SchemeConfig,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub proxy_script: Option<String>,
    #[serde(default = "default_allowed_transfers")]
    pub allowed_transfers: u8,
    #[serde(default = "default_max_errors")]
    pub max_errors: u32,
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    #[serde(default = "default_burst_limit")]
    pub burst_limit: u32,
    #[serde(default = "default_transfer_timeout_secs")]
    pub transfer_timeout_secs: u64,
    #[serde(default)]
    pub transfer_rate_limit: Option<u64>,
    #[serde(default)]
    pub lock_policy: LockPolicyConfig,
}

const fn default_port() -> u16 {
    21
}

const fn default_allowed_transfers() -> u8 {
    1
}

const fn default_max_errors() -> u32 {
    5
}

const fn default_retry_interval_secs() -> u64 {
    60
}

const fn default_block_size() -> usize {
    32 * 1024
}

const fn default_burst_limit() -> u32 {
    0
}

const fn default_transfer_timeout_secs() -> u64 {
    120
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

impl HostConfig {
    #[must_use]
    pub fn into_host(self) -> Host {
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
        Host {
            alias: self.alias,
            hostnames: (self.hostname, self.hostname_alt),
            current_toggle: 1,
            scheme,
            port: self.port,
            user: self.user,
            proxy_script: self.proxy_script,
            allowed_transfers: self.allowed_transfers,
            active_transfers: 0,
            max_errors: self.max_errors,
            retry_interval: Duration::from_secs(self.retry_interval_secs),
            block_size: self.block_size,
            file_size_offset: FileSizeOffset::Auto,
            transfer_rate_limit: self.transfer_rate_limit.and_then(NonZeroU64::new),
            options: HostOptions::none(),
            rename_file_busy: None,
            lock_policy,
            lock_file_name: None,
            burst_limit: self.burst_limit,
            transfer_timeout: Duration::from_secs(self.transfer_timeout_secs),
            error_history: afd_core::host::ErrorHistory::default(),
            error_counter: 0,
            status: HostStatus::none(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FdConfig {
    #[serde(default = "default_tick_interval_millis")]
    pub tick_interval_millis: u64,
    #[serde(default)]
    pub hosts: Vec<HostConfig>,
}

const fn default_tick_interval_millis() -> u64 {
    500
}

impl FdConfig {
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}
