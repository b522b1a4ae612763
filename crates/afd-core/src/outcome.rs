//! Error categorization for transfer worker exits.
//!
//! This mirrors the Fatal/Recoverable split used elsewhere in the workspace
//! for I/O errors, generalized to the three-way outcome a worker reports to
//! the dispatcher: the transfer either completed (possibly with more work
//! left in the pool directory), hit a transient condition worth retrying, or
//! hit something that can never succeed on retry.

use std::fmt;
use std::io;

/// How a transfer worker process exited, as reported to the dispatcher.
#[derive(Debug)]
pub enum WorkerOutcome {
    /// Every file in the job was sent and accounted for.
    Success,
    /// The burst coordinator found no further job; more files appeared in the
    /// pool directory after the worker's last scan (a concurrent AMG split).
    StillFilesToSend,
    /// A network or local condition that is worth retrying.
    TransientFailure(TransientKind),
    /// A condition that retrying cannot fix; the job is dropped.
    FatalFailure(FatalKind),
}

/// Transient failure kinds, worth a retry with backoff.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum TransientKind {
    /// Could not establish the control connection.
    ConnectError,
    /// Login was rejected.
    AuthError,
    /// `TYPE`/mode negotiation failed.
    TypeError,
    /// `CWD` failed and `create_target_dir` was not set or also failed.
    ChdirError,
    /// Opening the remote data channel failed.
    OpenRemoteError,
    /// A write to the remote data channel failed.
    WriteRemoteError,
    /// Closing the remote data channel failed.
    CloseRemoteError,
    /// The atomic rename/move of the uploaded file failed.
    MoveRemoteError,
    /// Reading the local source file failed.
    ReadLocalError,
    /// Acquiring or releasing the local append-list or lock state failed.
    WriteLockError,
    /// Removing a stale remote lock artifact failed.
    RemoveLockfileError,
    /// A network operation exceeded the host's `transfer_timeout`.
    Timeout,
}

impl TransientKind {
    /// Short tag used in the transfer log and the error-history ring.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::ConnectError => "connect",
            Self::AuthError => "auth",
            Self::TypeError => "type",
            Self::ChdirError => "chdir",
            Self::OpenRemoteError => "open-remote",
            Self::WriteRemoteError => "write-remote",
            Self::CloseRemoteError => "close-remote",
            Self::MoveRemoteError => "move-remote",
            Self::ReadLocalError => "read-local",
            Self::WriteLockError => "write-lock",
            Self::RemoveLockfileError => "remove-lockfile",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for TransientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Fatal failure kinds; the job is dropped and never retried.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum FatalKind {
    /// The local source file could not be opened at all.
    OpenLocalError,
    /// Allocating a transfer buffer failed.
    AllocError,
    /// The worker was killed by a signal (shutdown cascade or operator).
    SignalKilled,
    /// The job's pool directory disappeared before the worker could run.
    PoolDirMissing,
    /// A sibling worker on the same host is already sending this file name.
    DuplicateFileDetected,
    /// The job referenced a host or directory no longer in the configuration.
    ConfigurationInconsistency,
}

impl FatalKind {
    /// Short tag used in the transfer log.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::OpenLocalError => "open-local",
            Self::AllocError => "alloc",
            Self::SignalKilled => "signal-killed",
            Self::PoolDirMissing => "pool-dir-missing",
            Self::DuplicateFileDetected => "duplicate-file",
            Self::ConfigurationInconsistency => "config-inconsistency",
        }
    }
}

impl fmt::Display for FatalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl fmt::Display for WorkerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::StillFilesToSend => f.write_str("still-files-to-send"),
            Self::TransientFailure(kind) => write!(f, "transient({kind})"),
            Self::FatalFailure(kind) => write!(f, "fatal({kind})"),
        }
    }
}

impl std::error::Error for TransientKind {}
impl std::error::Error for FatalKind {}

/// Categorizes a local I/O error encountered while reading a source file.
///
/// Matches the categorization policy in §7: transient network-adjacent local
/// errors (would-block, interrupted) are treated the same as a remote retry;
/// anything that means the file itself is unusable is fatal.
#[must_use]
pub fn categorize_local_io_error(err: &io::Error) -> TransientOrFatalLocal {
    use io::ErrorKind::{Interrupted, NotFound, PermissionDenied, WouldBlock};

    match err.kind() {
        WouldBlock | Interrupted => TransientOrFatalLocal::Transient(TransientKind::ReadLocalError),
        NotFound | PermissionDenied => TransientOrFatalLocal::Fatal(FatalKind::OpenLocalError),
        _ => TransientOrFatalLocal::Transient(TransientKind::ReadLocalError),
    }
}

/// Result of classifying a local I/O error.
#[derive(Debug)]
pub enum TransientOrFatalLocal {
    /// Worth a single retry before escalating (per §7, a second occurrence of
    /// a local transient error escalates to fatal).
    Transient(TransientKind),
    /// Never worth retrying.
    Fatal(FatalKind),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorize_not_found_as_fatal() {
        let err = io::Error::from(io::ErrorKind::NotFound);
        assert!(matches!(
            categorize_local_io_error(&err),
            TransientOrFatalLocal::Fatal(FatalKind::OpenLocalError)
        ));
    }

    #[test]
    fn categorize_interrupted_as_transient() {
        let err = io::Error::from(io::ErrorKind::Interrupted);
        assert!(matches!(
            categorize_local_io_error(&err),
            TransientOrFatalLocal::Transient(TransientKind::ReadLocalError)
        ));
    }

    #[test]
    fn display_formats_outcome_variants() {
        assert_eq!(WorkerOutcome::Success.to_string(), "success");
        assert_eq!(
            WorkerOutcome::TransientFailure(TransientKind::Timeout).to_string(),
            "transient(timeout)"
        );
        assert_eq!(
            WorkerOutcome::FatalFailure(FatalKind::DuplicateFileDetected).to_string(),
            "fatal(duplicate-file)"
        );
    }
}
