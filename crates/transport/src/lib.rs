#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `RemoteTransport` is the capability boundary between a transfer worker
//! and the wire-level FTP/FTPS/SCP codecs. The codecs themselves are
//! explicitly out of scope for this core: this crate defines the trait a
//! worker programs against, plus [`mock::MockTransport`], an in-memory
//! implementation used by worker tests and by anything exercising the
//! state machine without a real network endpoint.
//!
//! # Design
//!
//! The trait follows the operation table from the specification's external
//! interfaces section one-for-one: connect, optional TLS upgrade, login,
//! directory change, type negotiation, listing, size probing, data-channel
//! open/write/close, rename, and the small single-shot commands (chmod,
//! set_mtime, dele, quit, keepalive). `sendfile` is a default-denied
//! optional fast path; only a transport that can offer true zero-copy
//! sendfile semantics overrides it.
//!
//! # Errors
//!
//! Every fallible method returns [`error::TransportError`]; workers convert
//! it to a transient outcome via [`error::TransportError::transient_kind`].

pub mod error;
pub mod mock;
pub mod session;

pub use error::TransportError;
pub use session::{ConnectMode, LoginOutcome, TransferDirection, TransferTypeCode, WriteMode};

/// The capability boundary a transfer worker programs against; see the
/// crate-level documentation for the operation-to-table mapping.
pub trait RemoteTransport: Send {
    /// Establishes the control channel.
    fn connect(&mut self, host: &str, port: u16, mode: ConnectMode) -> Result<(), TransportError>;

    /// Upgrades the control channel to TLS, if the transport supports it.
    fn auth_control(&mut self) -> Result<(), TransportError> {
        Err(TransportError::Unsupported("auth_control"))
    }

    /// Upgrades the data channel to TLS, if the transport supports it.
    fn auth_data(&mut self) -> Result<(), TransportError> {
        Err(TransportError::Unsupported("auth_data"))
    }

    /// Authenticates with the remote; may short-circuit to
    /// [`LoginOutcome::AlreadyLoggedIn`] if the server accepted `USER` alone.
    fn login(&mut self, user: &str, password: &str) -> Result<LoginOutcome, TransportError>;

    /// Sends a server-specific extension command.
    fn send_site(&mut self, cmd: &str) -> Result<(), TransportError>;

    /// Changes the remote working directory, optionally creating it first.
    fn cd(&mut self, path: &str, create_if_missing: bool) -> Result<(), TransportError>;

    /// Negotiates the transfer type.
    fn set_type(&mut self, mode: TransferTypeCode) -> Result<(), TransportError>;

    /// Raw directory listing lines; the caller parses the size column.
    fn list(&mut self, path: &str) -> Result<Vec<String>, TransportError>;

    /// Probes the remote file size via an out-of-band command, when the
    /// transport and host option both support it.
    fn size(&mut self, path: &str) -> Result<Option<u64>, TransportError>;

    /// Opens the data channel for `path` at `offset`, in `direction`.
    fn open_data(&mut self, path: &str, offset: u64, direction: TransferDirection) -> Result<(), TransportError>;

    /// Writes one block to the open data channel.
    fn write(&mut self, block: &[u8], mode: WriteMode) -> Result<usize, TransportError>;

    /// Closes the data channel. A zero-length file is reported via
    /// [`TransportError::ZeroLengthFile`], which the worker treats as a
    /// warning, not a transient or fatal failure.
    fn close_data(&mut self) -> Result<(), TransportError>;

    /// Renames a remote path. `fast` requests the single-command extension
    /// where the transport supports it instead of copy-then-delete.
    fn rename(&mut self, from: &str, to: &str, fast: bool, create_target: bool) -> Result<(), TransportError>;

    /// Applies a chmod mode string to a remote path.
    fn chmod(&mut self, path: &str, mode: &str) -> Result<(), TransportError>;

    /// Sets a remote path's modification time.
    fn set_mtime(&mut self, path: &str, mtime: std::time::SystemTime) -> Result<(), TransportError>;

    /// Deletes a remote path.
    fn dele(&mut self, path: &str) -> Result<(), TransportError>;

    /// Sends `QUIT` and releases the control channel.
    fn quit(&mut self) -> Result<(), TransportError>;

    /// Sends a protocol no-op to keep a long upload's control channel alive.
    fn keepalive(&mut self) -> Result<(), TransportError>;

    /// Optional zero-copy fast path, only available when TLS and header
    /// injection are both off; transports that cannot offer it leave the
    /// default, which reports [`TransportError::Unsupported`].
    fn sendfile(&mut self, _offset: &mut u64, _blocksize: usize) -> Result<usize, TransportError> {
        Err(TransportError::Unsupported("sendfile"))
    }
}
