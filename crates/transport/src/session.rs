//! Types shared by every [`crate::RemoteTransport`] operation.

use std::time::SystemTime;

/// How the transport establishes its data channel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectMode {
    /// `PORT`: the client listens, the server connects back.
    Active,
    /// `PASV`: the server listens, the client connects.
    Passive,
    /// `EPSV`: passive mode using the extended-passive address format.
    ExtendedPassive,
}

/// Outcome of [`crate::RemoteTransport::login`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoginOutcome {
    /// The server accepted the credentials with the usual two-step exchange.
    LoggedIn,
    /// The server returned success on `USER` alone; no password was needed.
    AlreadyLoggedIn,
}

/// `set_type`'s argument: `A` (ASCII), `I` (binary/image), or `N` (no-op).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransferTypeCode {
    Ascii,
    Image,
    NoOp,
}

/// Direction of a data channel opened by `open_data`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransferDirection {
    Read,
    Write,
}

/// A block handed to `write`, with an optional in-flight ASCII conversion
/// buffer. When `ascii` is set the transport performs LF -> CRLF conversion
/// on the fly rather than requiring the caller to pre-convert the block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WriteMode {
    pub ascii: bool,
}

impl WriteMode {
    #[must_use]
    pub const fn binary() -> Self {
        Self { ascii: false }
    }

    #[must_use]
    pub const fn ascii() -> Self {
        Self { ascii: true }
    }
}

/// Placeholder for a future mtime argument carried verbatim by
/// `RemoteTransport::set_mtime`; kept as a thin wrapper so callers are not
/// coupled to `std::time::SystemTime`'s representation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RemoteMtime(pub SystemTime);
