//! Structured errors a [`crate::RemoteTransport`] implementation reports.

use thiserror::Error;

use afd_core::TransientKind;

/// Failure modes a transport can report back to a transfer worker.
///
/// Every variant except [`TransportError::Unsupported`] and
/// [`TransportError::ZeroLengthFile`] maps onto a [`TransientKind`] via
/// [`TransportError::transient_kind`]; the worker uses that mapping to
/// decide retry/backoff versus giving up on the job.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not connect: {0}")]
    Connect(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("remote type negotiation failed: {0}")]
    Type(String),
    #[error("could not change remote directory: {0}")]
    Chdir(String),
    #[error("could not open remote data stream: {0}")]
    OpenRemote(String),
    #[error("write to remote failed: {0}")]
    WriteRemote(String),
    #[error("could not close remote data stream: {0}")]
    CloseRemote(String),
    #[error("remote rename failed: {0}")]
    MoveRemote(String),
    #[error("operation timed out")]
    Timeout,

    /// Close of a zero-length file; the specification treats this as a
    /// warning rather than a transient or fatal failure.
    #[error("remote reported zero-length file on close")]
    ZeroLengthFile,

    /// The operation has no backing implementation, e.g. `sendfile` on a
    /// transport that never offers the zero-copy fast path.
    #[error("operation not supported by this transport: {0}")]
    Unsupported(&'static str),
}

impl TransportError {
    /// Maps this error onto the worker-facing transient-failure taxonomy,
    /// or `None` for the two variants the worker handles specially.
    #[must_use]
    pub const fn transient_kind(&self) -> Option<TransientKind> {
        match self {
            Self::Connect(_) => Some(TransientKind::ConnectError),
            Self::Auth(_) => Some(TransientKind::AuthError),
            Self::Type(_) => Some(TransientKind::TypeError),
            Self::Chdir(_) => Some(TransientKind::ChdirError),
            Self::OpenRemote(_) => Some(TransientKind::OpenRemoteError),
            Self::WriteRemote(_) => Some(TransientKind::WriteRemoteError),
            Self::CloseRemote(_) => Some(TransientKind::CloseRemoteError),
            Self::MoveRemote(_) => Some(TransientKind::MoveRemoteError),
            Self::Timeout => Some(TransientKind::Timeout),
            Self::ZeroLengthFile | Self::Unsupported(_) => None,
        }
    }
}
