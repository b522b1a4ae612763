//! Scanner-level error kinds.

use thiserror::Error;

/// Directory-wide failures; a per-file I/O error during admission is
/// logged and that file is skipped rather than raised as an `AmgError`.
#[derive(Debug, Error)]
pub enum AmgError {
    /// The directory itself could not be read, e.g. it was removed.
    #[error("directory {path} is unreadable: {source}")]
    DirectoryUnreadable {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The pool directory could not be created.
    #[error("could not create pool directory {path}: {source}")]
    PoolDirCreate {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
