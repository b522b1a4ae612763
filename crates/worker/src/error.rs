//! Internal worker failures that are not one of the transfer outcomes
//! reported to the dispatcher; these surface as panics-avoided plumbing
//! errors (e.g. append-list I/O) the caller logs before mapping to a
//! [`afd_core::outcome::WorkerOutcome`].

use thiserror::Error;

use crate::append::AppendListError;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    AppendList(#[from] AppendListError),

    #[error("could not open local file {path:?}: {source}")]
    LocalOpen {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read local file {path:?}: {source}")]
    LocalRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
