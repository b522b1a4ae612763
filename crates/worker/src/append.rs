//! Persistent append list: `{file_name, byte_offset}` pairs that let a retry
//! resume a partially uploaded file (specification §4.5, "Append / resume").

use std::collections::HashMap;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures reading or writing a job's append-list file.
#[derive(Debug, Error)]
pub enum AppendListError {
    #[error("could not read append list {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write append list {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("malformed append list line in {path:?}: {line:?}")]
    Malformed { path: PathBuf, line: String },
}

/// The append list for one job: file name to bytes already sent.
#[derive(Clone, Debug, Default)]
pub struct AppendList {
    entries: HashMap<String, u64>,
}

impl AppendList {
    /// Loads the append list at `path`, or an empty one if it does not exist.
    pub fn load(path: &Path) -> Result<Self, AppendListError> {
        let file = match fs::File::open(path) {
            Ok(f) => f,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(AppendListError::Read { path: path.to_path_buf(), source }),
        };
        let mut entries = HashMap::new();
        for line in io::BufReader::new(file).lines() {
            let line = line.map_err(|source| AppendListError::Read { path: path.to_path_buf(), source })?;
            if line.is_empty() {
                continue;
            }
            let (name, offset) = line
                .rsplit_once(' ')
                .ok_or_else(|| AppendListError::Malformed { path: path.to_path_buf(), line: line.clone() })?;
            let offset: u64 = offset
                .parse()
                .map_err(|_| AppendListError::Malformed { path: path.to_path_buf(), line: line.clone() })?;
            entries.insert(name.to_string(), offset);
        }
        Ok(Self { entries })
    }

    /// Persists the append list to `path`, overwriting any prior contents.
    pub fn save(&self, path: &Path) -> Result<(), AppendListError> {
        let mut file = fs::File::create(path).map_err(|source| AppendListError::Write { path: path.to_path_buf(), source })?;
        for (name, offset) in &self.entries {
            writeln!(file, "{name} {offset}").map_err(|source| AppendListError::Write { path: path.to_path_buf(), source })?;
        }
        Ok(())
    }

    /// Bytes already sent for `file_name`, if tracked.
    #[must_use]
    pub fn offset(&self, file_name: &str) -> Option<u64> {
        self.entries.get(file_name).copied()
    }

    /// Records `bytes_sent` for `file_name`, replacing any prior entry.
    pub fn record(&mut self, file_name: &str, bytes_sent: u64) {
        self.entries.insert(file_name.to_string(), bytes_sent);
    }

    /// Removes `file_name`'s entry, e.g. once it has fully transferred.
    pub fn clear(&mut self, file_name: &str) {
        self.entries.remove(file_name);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
