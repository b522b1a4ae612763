//! An in-memory [`RemoteTransport`] used by worker tests and anywhere else
//! that needs to exercise the state machine without a real FTP/FTPS/SCP
//! endpoint, which this core treats as an external collaborator.

use std::collections::HashMap;
use std::time::SystemTime;

use crate::error::TransportError;
use crate::session::{ConnectMode, LoginOutcome, TransferDirection, TransferTypeCode, WriteMode};
use crate::RemoteTransport;

struct OpenTransfer {
    path: String,
    direction: TransferDirection,
    buffer: Vec<u8>,
    read_cursor: usize,
}

/// A transport backed by in-memory maps instead of a socket.
///
/// Directories and files are both plain string keys; `connect`/`login`/`cd`
/// can each be made to fail once via the `fail_*` injection points so
/// worker tests can drive every retry path deterministically.
#[derive(Default)]
pub struct MockTransport {
    connected: bool,
    current_dir: String,
    directories: std::collections::HashSet<String>,
    files: HashMap<String, Vec<u8>>,
    mtimes: HashMap<String, SystemTime>,
    open_transfer: Option<OpenTransfer>,
    already_logged_in: bool,
    pub fail_next_connect: bool,
    pub fail_next_login: bool,
    pub fail_next_write: bool,
    /// Fails the next `open_data` with a "file busy" reply, the signal a
    /// worker's `rename_file_busy` retry looks for.
    pub fail_next_open_data_busy: bool,
}

impl MockTransport {
    /// A fresh transport with only the root directory present.
    #[must_use]
    pub fn new() -> Self {
        let mut directories = std::collections::HashSet::new();
        directories.insert(String::new());
        Self {
            current_dir: String::new(),
            directories,
            ..Self::default()
        }
    }

    /// Seeds a file directly, bypassing `open_data`/`write`/`close_data`,
    /// for tests that need a pre-existing remote file (e.g. for `size` or
    /// append/resume scenarios).
    pub fn seed_file(&mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), contents.into());
    }

    /// Marks the next `login` call as a no-password already-authenticated
    /// response, per the `AlreadyLoggedIn` contract.
    pub fn mark_already_logged_in(&mut self) {
        self.already_logged_in = true;
    }

    /// Reads back a committed file's contents, for assertions.
    #[must_use]
    pub fn file_contents(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }
}

impl RemoteTransport for MockTransport {
    fn connect(&mut self, host: &str, _port: u16, _mode: ConnectMode) -> Result<(), TransportError> {
        if std::mem::take(&mut self.fail_next_connect) {
            return Err(TransportError::Connect(format!("injected failure connecting to {host}")));
        }
        self.connected = true;
        Ok(())
    }

    fn login(&mut self, user: &str, _password: &str) -> Result<LoginOutcome, TransportError> {
        if std::mem::take(&mut self.fail_next_login) {
            return Err(TransportError::Auth(format!("injected failure authenticating {user}")));
        }
        if self.already_logged_in {
            return Ok(LoginOutcome::AlreadyLoggedIn);
        }
        Ok(LoginOutcome::LoggedIn)
    }

    fn send_site(&mut self, _cmd: &str) -> Result<(), TransportError> {
        Ok(())
    }

    fn cd(&mut self, path: &str, create_if_missing: bool) -> Result<(), TransportError> {
        if self.directories.contains(path) {
            self.current_dir = path.to_string();
            return Ok(());
        }
        if create_if_missing {
            self.directories.insert(path.to_string());
            self.current_dir = path.to_string();
            return Ok(());
        }
        Err(TransportError::Chdir(format!("no such remote directory: {path}")))
    }

    fn set_type(&mut self, _mode: TransferTypeCode) -> Result<(), TransportError> {
        Ok(())
    }

    fn list(&mut self, path: &str) -> Result<Vec<String>, TransportError> {
        let prefix = format!("{path}/");
        Ok(self
            .files
            .iter()
            .filter(|(name, _)| name.starts_with(&prefix))
            .map(|(name, data)| format!("{name} {}", data.len()))
            .collect())
    }

    fn size(&mut self, path: &str) -> Result<Option<u64>, TransportError> {
        Ok(self.files.get(path).map(|data| data.len() as u64))
    }

    fn open_data(&mut self, path: &str, offset: u64, direction: TransferDirection) -> Result<(), TransportError> {
        if std::mem::take(&mut self.fail_next_open_data_busy) {
            return Err(TransportError::OpenRemote(format!("550 {path}: file busy, cannot STOR")));
        }
        if !self.connected {
            return Err(TransportError::OpenRemote("not connected".into()));
        }
        let buffer = match direction {
            TransferDirection::Write => self
                .files
                .get(path)
                .map(|existing| existing[..(offset as usize).min(existing.len())].to_vec())
                .unwrap_or_default(),
            TransferDirection::Read => self.files.get(path).cloned().unwrap_or_default(),
        };
        self.open_transfer = Some(OpenTransfer {
            path: path.to_string(),
            direction,
            buffer,
            read_cursor: offset as usize,
        });
        Ok(())
    }

    fn write(&mut self, block: &[u8], mode: WriteMode) -> Result<usize, TransportError> {
        if std::mem::take(&mut self.fail_next_write) {
            return Err(TransportError::WriteRemote("injected write failure".into()));
        }
        let transfer = self
            .open_transfer
            .as_mut()
            .ok_or_else(|| TransportError::WriteRemote("no open data channel".into()))?;
        if mode.ascii {
            for &byte in block {
                if byte == b'\n' {
                    transfer.buffer.push(b'\r');
                }
                transfer.buffer.push(byte);
            }
        } else {
            transfer.buffer.extend_from_slice(block);
        }
        Ok(block.len())
    }

    fn close_data(&mut self) -> Result<(), TransportError> {
        let transfer = self
            .open_transfer
            .take()
            .ok_or_else(|| TransportError::CloseRemote("no open data channel".into()))?;
        let is_empty = transfer.buffer.is_empty();
        if matches!(transfer.direction, TransferDirection::Write) {
            self.files.insert(transfer.path, transfer.buffer);
        }
        if is_empty {
            return Err(TransportError::ZeroLengthFile);
        }
        Ok(())
    }

    fn rename(&mut self, from: &str, to: &str, _fast: bool, create_target: bool) -> Result<(), TransportError> {
        let data = self
            .files
            .remove(from)
            .ok_or_else(|| TransportError::MoveRemote(format!("no such remote file: {from}")))?;
        if create_target {
            if let Some((dir, _)) = to.rsplit_once('/') {
                self.directories.insert(dir.to_string());
            }
        }
        self.files.insert(to.to_string(), data);
        Ok(())
    }

    fn chmod(&mut self, _path: &str, _mode: &str) -> Result<(), TransportError> {
        Ok(())
    }

    fn set_mtime(&mut self, path: &str, mtime: SystemTime) -> Result<(), TransportError> {
        self.mtimes.insert(path.to_string(), mtime);
        Ok(())
    }

    fn dele(&mut self, path: &str) -> Result<(), TransportError> {
        self.files.remove(path);
        Ok(())
    }

    fn quit(&mut self) -> Result<(), TransportError> {
        self.connected = false;
        Ok(())
    }

    fn keepalive(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}
