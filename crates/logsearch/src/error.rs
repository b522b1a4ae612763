//! Failures a search can hit while stat'ing or mapping rotated log files.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogSearchError {
    #[error("could not stat {path:?}: {source}")]
    Stat { path: PathBuf, source: std::io::Error },

    #[error("could not open {path:?}: {source}")]
    Open { path: PathBuf, source: std::io::Error },

    #[error("could not map {path:?}: {source}")]
    Map { path: PathBuf, source: std::io::Error },
}
