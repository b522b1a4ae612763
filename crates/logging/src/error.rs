//! Writer-side error kinds. These never propagate to a producer; per the
//! failure model, a writer logs them to the system category and moves on.

use thiserror::Error;

/// Failure modes a log writer can hit while rotating or appending.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The current file could not be opened, written, or flushed.
    #[error("log file I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Rotation could not shift the numbered file set, e.g. a permission
    /// error partway through the rename chain.
    #[error("log rotation failed for category {category}: {source}")]
    Rotation {
        /// File stem of the category being rotated.
        category: &'static str,
        #[source]
        source: std::io::Error,
    },
}
