//! Archive-manager failure kinds.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("could not create archive directory {path:?}: {source}")]
    DirectoryCreate { path: PathBuf, source: std::io::Error },

    #[error("could not move {file_name} into {path:?}: {source}")]
    Move { file_name: String, path: PathBuf, source: std::io::Error },
}
