//! The contract between the directory scanner and the job dispatcher.
//!
//! With the `serde` feature enabled, [`JobDescriptor`] and its fields
//! round-trip through JSON, the wire format the scanner and dispatcher
//! processes exchange a job over.

use std::time::SystemTime;

/// Wire scheme used to reach a recipient.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scheme {
    /// Plain FTP.
    Ftp,
    /// FTP with the control channel upgraded to TLS.
    FtpsControl,
    /// FTP with both the control and data channels upgraded to TLS.
    FtpsBoth,
    /// SCP over an SSH session.
    Scp,
}

/// How an uploaded file is renamed during transfer to prevent a partial
/// upload from being observed by the remote site's own processing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LockPolicy {
    /// No in-flight renaming; the final name is used from the first byte.
    None,
    /// Upload to `.name`, rename to `name` after close.
    Dot,
    /// Like `Dot`, but the final name also carries a trailing `.`.
    DotVms,
    /// Append a per-host suffix during transfer, strip it on rename.
    Postfix,
    /// Create (and later remove) a dedicated zero-byte remote lock file.
    LockFile,
    /// Append `.{unique_number}` to the in-flight name.
    Unique,
    /// Append `-{retries}` to the in-flight name; DELE the previous attempt's.
    Sequence,
}

/// ASCII/binary/DOS transfer mode negotiated for a file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransferMode {
    /// Binary, no `TYPE` command sent.
    Image,
    /// ASCII; LF is converted to CRLF on the wire.
    Ascii,
    /// DOS; converts to ASCII or binary depending on the host's
    /// `FTP_IGNORE_BIN` option.
    Dos,
}

/// One file carried by a job descriptor.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileEntry {
    /// File name, relative to the pool directory.
    pub name: String,
    /// Size in bytes at the moment the file was admitted.
    pub size: u64,
    /// Modification time at the moment the file was admitted.
    pub mtime: SystemTime,
}

/// Phase of a transfer worker's connection, as published to the shared
/// status area.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ConnectStatus {
    /// No worker is occupying the slot.
    #[default]
    Disconnect,
    /// Worker is establishing the connection and logging in.
    Connecting,
    /// Worker is transferring the first job on this connection.
    FtpActive,
    /// Worker is transferring a subsequent, burst-chained job.
    FtpBurstActive,
    /// Worker is draining locks and issuing `QUIT`.
    Closing,
    /// Transient: worker exists but is between network operations.
    NotWorking,
}

/// A rename rule applied to the remote name of a file after upload.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransRename {
    /// Pattern matched against the file name (glob-style, `*` and `?`).
    pub pattern: String,
    /// Replacement template; `*` in the pattern binds to `{}` in the template.
    pub replacement: String,
    /// Restrict this rule to one hostname toggle position, if set.
    pub toggle_only: Option<u8>,
}

/// The AMG-to-FD contract: one batch of files bound for one host.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JobDescriptor {
    /// Monotone, process-wide unique job id.
    pub job_id: u64,
    /// Directory the batch was admitted from.
    pub directory_id: u32,
    /// Recipient host alias.
    pub host_alias: String,
    /// Wire scheme for this attempt.
    pub scheme: Scheme,
    /// Target remote directory.
    pub target_path: String,
    /// When the batch was created.
    pub created_at: SystemTime,
    /// Incremented when one scan produces more than one batch.
    pub split_job_counter: u32,
    /// Process-wide monotone number, used in the pool directory name.
    pub unique_number: u64,
    /// Lock policy this attempt should use.
    pub lock_policy: LockPolicy,
    /// ASCII/Image/DOS transfer mode.
    pub transfer_mode: TransferMode,
    /// Optional remote chmod string applied after close.
    pub chmod: Option<String>,
    /// Optional trans-rename rule.
    pub trans_rename: Option<TransRename>,
    /// Archive retention in seconds; 0 means delete instead of archive.
    pub archive_time: u64,
    /// Whether uploads get the SOH/ETX header wrapper.
    pub header_injection: bool,
    /// Names, sizes, and mtimes of the files in the pool directory.
    pub files: Vec<FileEntry>,
    /// File names eligible for append/resume on this attempt.
    pub restart_names: Vec<String>,
    /// Directory of this job's pool directory on local disk.
    pub pool_dir: std::path::PathBuf,
    /// Zero-based retry attempt count for this job id.
    pub attempt: u32,
    /// When set, the dispatcher flips the host's hostname toggle before
    /// spawning a worker for this job.
    pub toggle_host: bool,
}

impl JobDescriptor {
    /// Total bytes across every file in the batch.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Returns a new descriptor for a retry attempt, with the attempt counter
    /// incremented and the file list narrowed to what remains unsent.
    #[must_use]
    pub fn retry_with_remaining(&self, remaining: Vec<FileEntry>) -> Self {
        Self {
            files: remaining,
            attempt: self.attempt + 1,
            ..self.clone()
        }
    }
}
