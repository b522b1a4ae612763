//! The addressing and runtime-state model for a single outbound recipient.

use crate::job::ConnectStatus;
use std::time::Instant;

/// Bit flags describing protocol behaviour for a host, combinable.
///
/// Modelled as a plain bitmask rather than pulling in a flags crate: the set
/// is small, fixed by the specification, and every AFD process needs to read
/// and write it through the memory-mapped status area without going through a
/// serialization layer.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HostOptions(u32);

impl HostOptions {
    /// Use PASV/EPSV instead of PORT for data connections.
    pub const PASSIVE_MODE: Self = Self(1 << 0);
    /// Send a protocol keep-alive on the control channel during long uploads.
    pub const KEEP_ALIVE: Self = Self(1 << 1);
    /// Use the single-command CWD shortcut when the server supports it.
    pub const FAST_CD: Self = Self(1 << 2);
    /// Never negotiate ASCII mode even when a directory requests it.
    pub const IGNORE_BINARY: Self = Self(1 << 3);
    /// Reapply the local mtime after a successful upload.
    pub const PRESERVE_MTIME: Self = Self(1 << 4);
    /// Create the remote target directory on demand if `cd` fails.
    pub const CREATE_TARGET_DIR: Self = Self(1 << 5);
    /// Issue `SIZE` to probe remote file size instead of parsing `LIST`.
    pub const AUTO_SIZE_DETECT: Self = Self(1 << 6);
    /// DOS line endings are treated as binary, not ASCII, transfers.
    pub const FTP_IGNORE_BIN: Self = Self(1 << 7);
    /// Prefix uploaded payloads with a derived SOH/ETX header.
    pub const FILE_NAME_IS_HEADER: Self = Self(1 << 8);

    /// The empty flag set.
    #[must_use]
    pub const fn none() -> Self {
        Self(0)
    }

    /// Returns `true` when every bit set in `other` is also set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Returns the union of two flag sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl std::ops::BitOr for HostOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Combinable host status flags, mutated under `LOCK_HS`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HostStatus(u32);

impl HostStatus {
    /// Operator disabled the host entirely; no new jobs are scheduled.
    pub const DISABLED: Self = Self(1 << 0);
    /// Operator paused the host; existing jobs finish, new ones wait.
    pub const PAUSED: Self = Self(1 << 1);
    /// New directory scans classify files for this host as QUEUED.
    pub const STOP_TRANSFER: Self = Self(1 << 2);
    /// The error counter exceeded `max_errors`; requires operator clearing.
    pub const AUTO_PAUSED: Self = Self(1 << 3);
    /// Host is considered unreachable after repeated connect failures.
    pub const ERROR_OFFLINE: Self = Self(1 << 4);
    /// Both the primary and secondary hostname slots are mid-transfer.
    pub const HOST_TWO_ACTIVE: Self = Self(1 << 5);

    /// The empty flag set (host is healthy and idle).
    #[must_use]
    pub const fn none() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[must_use]
    pub const fn insert(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn remove(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Whether the dispatcher may spawn new workers for this host.
    #[must_use]
    pub const fn accepts_new_jobs(self) -> bool {
        !self.contains(Self::DISABLED)
            && !self.contains(Self::PAUSED)
            && !self.contains(Self::STOP_TRANSFER)
            && !self.contains(Self::AUTO_PAUSED)
            && !self.contains(Self::ERROR_OFFLINE)
    }
}

/// How a directory's `file_size_offset` policy locates the size column in a
/// `LIST` response, or whether to probe with `SIZE` instead.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileSizeOffset {
    /// Issue `SIZE` rather than parsing a listing.
    Auto,
    /// Byte offset of the size column within a whitespace-delimited `LIST` line.
    Column(u16),
}

/// Two-slot FIFO of the most recent transient error kinds for a host.
#[derive(Clone, Copy, Debug, Default)]
pub struct ErrorHistory {
    slots: [Option<crate::outcome::TransientKind>; 2],
}

impl ErrorHistory {
    /// Records a new error kind, evicting the oldest entry.
    pub fn push(&mut self, kind: crate::outcome::TransientKind) {
        self.slots[0] = self.slots[1];
        self.slots[1] = Some(kind);
    }

    /// Returns the two most recent kinds, oldest first, `None` where unset.
    #[must_use]
    pub const fn entries(&self) -> [Option<crate::outcome::TransientKind>; 2] {
        self.slots
    }

    /// Clears the history, e.g. after a successful transfer.
    pub fn clear(&mut self) {
        self.slots = [None, None];
    }
}

/// Per-worker-slot status, one per host's `allowed_transfers`.
///
/// This is the live mirror of the record the specification places inside the
/// shared status area; [`fsa`](../fsa/index.html) owns the mmap-backed
/// storage, this struct is the plain value read out of or written into it.
#[derive(Clone, Debug, Default)]
pub struct JobSlotStatus {
    /// Current phase of the worker occupying this slot.
    pub connect_status: ConnectStatus,
    /// Total files in the job currently assigned to this slot.
    pub files_to_send: u32,
    /// Files completed so far in the current job.
    pub files_done: u32,
    /// Total bytes to send for the current job.
    pub file_size_to_send: u64,
    /// Bytes completed so far across the current job's finished files.
    pub file_size_done: u64,
    /// Size of the file currently being uploaded.
    pub file_size_in_use: u64,
    /// Bytes sent so far for the file currently being uploaded.
    pub file_size_in_use_done: u64,
    /// Name of the file currently being uploaded, if any.
    pub file_name_in_use: Option<String>,
    /// Job id occupying this slot, if any.
    pub job_id_in_use: Option<u64>,
    /// Number of jobs chained onto the live connection via burst.
    pub burst_counter: u32,
}

impl JobSlotStatus {
    /// A slot with no worker assigned.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            connect_status: ConnectStatus::Disconnect,
            ..Self::default()
        }
    }
}

/// A worker slot's scheduling state as tracked by the dispatcher (C4), not to
/// be confused with [`JobSlotStatus`] which is the transfer-progress view
/// published into the shared status area.
#[derive(Debug)]
pub enum SlotState {
    /// No worker occupies the slot.
    Idle,
    /// A worker process is running the named job.
    Running {
        /// OS process id of the transfer worker.
        pid: u32,
        /// Job id the worker is (or was, across a burst) processing.
        job_id: u64,
    },
    /// The slot is serving out a retry backoff before becoming eligible again.
    CoolingDown {
        /// Monotonic instant after which the slot becomes `Idle` again.
        until: Instant,
    },
}

/// The unit of outbound addressing: a stable alias, up to two real hostnames,
/// credentials, concurrency and retry policy, and live runtime counters.
#[derive(Clone, Debug)]
pub struct Host {
    /// Stable alias used by directory rules and logs; never changes.
    pub alias: String,
    /// Primary and, optionally, secondary real hostname for toggling.
    pub hostnames: (String, Option<String>),
    /// Which of the two hostnames is currently selected.
    pub current_toggle: u8,
    /// Scheme and port used to reach this host.
    pub scheme: crate::job::Scheme,
    pub port: u16,
    /// Configured login user; password lives in the host configuration file,
    /// never logged or placed in a job descriptor.
    pub user: String,
    /// Optional local script run to establish a proxy hop before the real
    /// connection is opened; `None` connects directly.
    pub proxy_script: Option<String>,
    /// Maximum number of concurrent transfers allowed to this host.
    pub allowed_transfers: u8,
    /// Current count of slots with `connect_status != Disconnect`.
    pub active_transfers: u8,
    /// Maximum retry attempts before auto-pausing the host.
    pub max_errors: u32,
    /// Base retry interval; actual delay is `retry_interval * backoff(attempt)`.
    pub retry_interval: std::time::Duration,
    /// I/O block size used for each `write` call.
    pub block_size: usize,
    /// How the remote file size is determined for append/resume.
    pub file_size_offset: FileSizeOffset,
    /// Optional per-process transfer rate limit, bytes per second.
    pub transfer_rate_limit: Option<std::num::NonZeroU64>,
    /// Protocol option flags.
    pub options: HostOptions,
    /// Character appended to a local filename when a rename races and loses.
    pub rename_file_busy: Option<char>,
    /// Lock policy applied to in-flight uploads to this host.
    pub lock_policy: crate::job::LockPolicy,
    /// Remote file name used by [`crate::job::LockPolicy::LockFile`]; ignored
    /// by every other policy.
    pub lock_file_name: Option<String>,
    /// Maximum number of jobs chained on one connection via burst.
    pub burst_limit: u32,
    /// Transfer timeout applied to every network operation.
    pub transfer_timeout: std::time::Duration,
    /// Most recent transient error kinds.
    pub error_history: ErrorHistory,
    /// Consecutive transient-error count since the last success.
    pub error_counter: u32,
    /// Combinable host status flags.
    pub status: HostStatus,
}

impl Host {
    /// Returns the real hostname selected by `current_toggle`.
    #[must_use]
    pub fn active_hostname(&self) -> &str {
        if self.current_toggle == 2 {
            self.hostnames
                .1
                .as_deref()
                .unwrap_or(&self.hostnames.0)
        } else {
            &self.hostnames.0
        }
    }

    /// Flips `current_toggle` to the other configured hostname, if any.
    pub fn toggle(&mut self) {
        if self.hostnames.1.is_some() {
            self.current_toggle = if self.current_toggle == 2 { 1 } else { 2 };
        }
    }

    /// Backoff-adjusted retry delay for the given attempt count (0-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> std::time::Duration {
        let factor = 1u32 << attempt.min(6);
        self.retry_interval.saturating_mul(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_status_accepts_new_jobs_when_healthy() {
        assert!(HostStatus::none().accepts_new_jobs());
    }

    #[test]
    fn host_status_rejects_new_jobs_when_paused() {
        let status = HostStatus::none().insert(HostStatus::PAUSED);
        assert!(!status.accepts_new_jobs());
    }

    #[test]
    fn host_status_remove_clears_only_that_flag() {
        let status = HostStatus::PAUSED.insert(HostStatus::AUTO_PAUSED);
        let cleared = status.remove(HostStatus::PAUSED);
        assert!(!cleared.contains(HostStatus::PAUSED));
        assert!(cleared.contains(HostStatus::AUTO_PAUSED));
    }

    #[test]
    fn toggle_without_secondary_hostname_is_noop() {
        let mut host = sample_host();
        host.toggle();
        assert_eq!(host.current_toggle, 1);
        assert_eq!(host.active_hostname(), "h1.example");
    }

    #[test]
    fn toggle_with_secondary_hostname_flips() {
        let mut host = sample_host();
        host.hostnames.1 = Some("h2.example".to_string());
        host.toggle();
        assert_eq!(host.active_hostname(), "h2.example");
        host.toggle();
        assert_eq!(host.active_hostname(), "h1.example");
    }

    #[test]
    fn error_history_keeps_two_most_recent() {
        let mut hist = ErrorHistory::default();
        hist.push(crate::outcome::TransientKind::ConnectError);
        hist.push(crate::outcome::TransientKind::Timeout);
        hist.push(crate::outcome::TransientKind::AuthError);
        assert_eq!(
            hist.entries(),
            [
                Some(crate::outcome::TransientKind::Timeout),
                Some(crate::outcome::TransientKind::AuthError),
            ]
        );
    }

    #[test]
    fn backoff_grows_and_caps() {
        let mut host = sample_host();
        host.retry_interval = std::time::Duration::from_secs(1);
        assert_eq!(host.backoff(0), std::time::Duration::from_secs(1));
        assert_eq!(host.backoff(1), std::time::Duration::from_secs(2));
        assert_eq!(host.backoff(10), std::time::Duration::from_secs(64));
    }

    fn sample_host() -> Host {
        Host {
            alias: "h1".into(),
            hostnames: ("h1.example".into(), None),
            current_toggle: 1,
            scheme: crate::job::Scheme::Ftp,
            port: 21,
            user: "afd".into(),
            proxy_script: None,
            allowed_transfers: 2,
            active_transfers: 0,
            max_errors: 5,
            retry_interval: std::time::Duration::from_secs(10),
            block_size: 32 * 1024,
            file_size_offset: FileSizeOffset::Auto,
            transfer_rate_limit: None,
            options: HostOptions::none(),
            rename_file_busy: Some('~'),
            lock_policy: crate::job::LockPolicy::Dot,
            lock_file_name: None,
            burst_limit: 10,
            transfer_timeout: std::time::Duration::from_secs(120),
            error_history: ErrorHistory::default(),
            error_counter: 0,
            status: HostStatus::none(),
        }
    }
}
