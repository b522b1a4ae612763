//! Per-job archive path caching and the move into it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use afd_core::job::JobDescriptor;
use tracing::debug;

use crate::error::ArchiveError;
use crate::path::{archive_dir, epoch_bucket};

/// Owns the archive root and the job-id to archive-directory cache the
/// specification's "first call for a job creates the directory;
/// subsequent calls within the same `job_meta` reuse the cached path"
/// contract requires.
#[derive(Debug)]
pub struct ArchiveManager {
    root: PathBuf,
    cache: HashMap<u64, PathBuf>,
}

impl ArchiveManager {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), cache: HashMap::new() }
    }

    /// Resolves (creating on first use) the archive directory for `job`.
    pub fn dir_for(&mut self, job: &JobDescriptor, now: SystemTime) -> Result<PathBuf, ArchiveError> {
        if let Some(cached) = self.cache.get(&job.job_id) {
            return Ok(cached.clone());
        }
        let bucket = epoch_bucket(now, job.archive_time);
        let dir = archive_dir(&self.root, &job.host_alias, job.scheme, bucket, job.job_id);
        fs::create_dir_all(&dir).map_err(|source| ArchiveError::DirectoryCreate { path: dir.clone(), source })?;
        debug!(job_id = job.job_id, path = %dir.display(), "archive directory ready");
        self.cache.insert(job.job_id, dir.clone());
        Ok(dir)
    }

    /// Moves `file_name` out of `pool_dir` into this job's archive
    /// directory (created if this is the first file archived for the
    /// job), returning the file's final archived path.
    pub fn move_in(&mut self, pool_dir: &Path, file_name: &str, job: &JobDescriptor, now: SystemTime) -> Result<PathBuf, ArchiveError> {
        let dir = self.dir_for(job, now)?;
        let from = pool_dir.join(file_name);
        let to = dir.join(file_name);
        fs::rename(&from, &to).map_err(|source| ArchiveError::Move { file_name: file_name.to_string(), path: to.clone(), source })?;
        Ok(to)
    }

    /// Adapter matching the `archive: impl FnMut(&Path, &str, &JobDescriptor)
    /// -> std::io::Result<PathBuf>` shape a transfer worker drives; `now` is
    /// sampled once per call rather than threaded through, since this is
    /// invoked once per archived file rather than once per job.
    pub fn archive(&mut self, pool_dir: &Path, file_name: &str, job: &JobDescriptor, now: SystemTime) -> std::io::Result<PathBuf> {
        self.move_in(pool_dir, file_name, job, now).map_err(std::io::Error::other)
    }
}
