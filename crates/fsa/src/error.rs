//! Error kinds surfaced by the shared status area.

use thiserror::Error;

/// Failure modes of attaching to or operating on the shared status area.
#[derive(Debug, Error)]
pub enum FsaError {
    /// The underlying file could not be opened, grown, or mapped.
    #[error("shared status area I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// The mapped header's magic or version did not match what this build
    /// expects; the file belongs to an incompatible AFD version.
    #[error("shared status area header mismatch (expected magic {expected_magic:#x}, found {found_magic:#x})")]
    HeaderMismatch {
        /// Magic this build expects.
        expected_magic: u32,
        /// Magic actually present in the file.
        found_magic: u32,
    },

    /// The caller's cached generation counter is behind the file's current
    /// generation; any `index` obtained before this must be re-resolved via
    /// [`crate::area::SharedStatusArea::lookup_host`].
    #[error("shared status area mapping is stale, re-attach required")]
    StaleMapping,

    /// No host record exists for the requested alias.
    #[error("no host record for alias {0:?}")]
    NotFound(String),

    /// An advisory byte-range lock could not be acquired or released.
    #[error("advisory lock operation failed: {0}")]
    Lock(std::io::Error),

    /// The requested host index is out of bounds for the current mapping.
    #[error("host index {0} is out of bounds")]
    IndexOutOfBounds(u32),
}
