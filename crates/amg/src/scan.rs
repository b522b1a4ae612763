//! Ties classification, aging, admission, and pool-dir moves into one scan.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use afd_core::directory::Directory;
use afd_core::{DeleteReason, FileEntry, JobDescriptor, LockPolicy, Scheme, TransferMode};

use crate::age::{classify_for_deletion, AgeDecision};
use crate::classify::{classify_entry, EntryClass};
use crate::error::AmgError;
use crate::pool_dir::{PoolDirName, UniqueNumberGenerator};
use crate::select_batch;

/// What one call to [`DirectoryScanner::scan_once`] produced.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// One descriptor per recipient that received a non-empty batch.
    pub jobs: Vec<JobDescriptor>,
    /// Files removed without being sent, with their delete-log reason.
    pub deletions: Vec<(PathBuf, DeleteReason)>,
    /// Files whose stat or rename failed; logged (receive-log, WARN) and
    /// otherwise ignored by the caller.
    pub skipped: Vec<(PathBuf, std::io::Error)>,
}

/// Scans directories and produces [`ScanOutcome`]s; holds no state of its
/// own beyond the unique-number source, which must be shared process-wide.
#[derive(Debug, Default)]
pub struct DirectoryScanner {
    unique_numbers: UniqueNumberGenerator,
}

fn has_lock_suffix(file_name: &str) -> bool {
    file_name.starts_with('.')
}

impl DirectoryScanner {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            unique_numbers: UniqueNumberGenerator::new(),
        }
    }

    /// Runs one scan of `directory`.
    ///
    /// `host_accepts_new_jobs` answers whether a recipient's host currently
    /// accepts new work. `pool_root` is where fresh pool directories are
    /// created. `next_job_id` hands out the next process-wide job id.
    ///
    /// A file claimed by one recipient's batch is removed from candidacy for
    /// every later recipient in the same scan, so it is never renamed into
    /// two pool directories: the specification's "referenced by exactly one
    /// live Job Descriptor" invariant extends to at most one claim per scan.
    pub fn scan_once(
        &self,
        directory: &Directory,
        now: SystemTime,
        pool_root: &Path,
        host_accepts_new_jobs: impl Fn(&str) -> bool,
        mut next_job_id: impl FnMut() -> u64,
    ) -> Result<ScanOutcome, AmgError> {
        let mut outcome = ScanOutcome::default();
        let mut unclaimed = self.stat_entries(directory, &mut outcome)?;

        let any_recipient_accepts = directory
            .recipients
            .iter()
            .any(|r| host_accepts_new_jobs(&r.host_alias));

        unclaimed.retain(|(path, entry)| {
            let file_name = entry.name.as_str();
            let age = now.duration_since(entry.mtime).unwrap_or_default();

            if has_lock_suffix(file_name) {
                let decision = classify_for_deletion(EntryClass::Unknown, age, directory.old_file_time, true);
                return !Self::apply_deletion(directory, path, decision, &mut outcome);
            }

            let class = if directory.recipients.is_empty() {
                EntryClass::Unknown
            } else {
                classify_entry(true, any_recipient_accepts)
            };
            let decision = classify_for_deletion(class, age, directory.old_file_time, false);
            !Self::apply_deletion(directory, path, decision, &mut outcome)
        });

        let mut split_job_counter = 0u32;
        for recipient in &directory.recipients {
            if !host_accepts_new_jobs(&recipient.host_alias) {
                continue;
            }
            let candidates: Vec<FileEntry> = unclaimed.iter().map(|(_, entry)| entry.clone()).collect();
            let batch = select_batch(&candidates, directory.max_copied_files as usize, directory.max_copied_bytes);
            if batch.is_empty() {
                continue;
            }

            let claimed: std::collections::HashSet<String> = batch.iter().map(|e| e.name.clone()).collect();
            let pool_name = PoolDirName {
                host_alias: recipient.host_alias.clone(),
                creation_time: now
                    .duration_since(SystemTime::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs(),
                split_job_counter,
                unique_number: self.unique_numbers.next(),
            };
            let pool_dir = pool_root.join(pool_name.format());
            fs::create_dir_all(&pool_dir).map_err(|source| AmgError::PoolDirCreate {
                path: pool_dir.clone(),
                source,
            })?;

            let mut moved = Vec::new();
            unclaimed.retain(|(path, entry)| {
                if !claimed.contains(&entry.name) {
                    return true;
                }
                match fs::rename(path, pool_dir.join(&entry.name)) {
                    Ok(()) => moved.push(entry.clone()),
                    Err(err) => outcome.skipped.push((path.clone(), err)),
                }
                false
            });

            if !moved.is_empty() {
                split_job_counter += 1;
                outcome.jobs.push(JobDescriptor {
                    job_id: next_job_id(),
                    directory_id: directory.id,
                    host_alias: recipient.host_alias.clone(),
                    scheme: Scheme::Ftp,
                    target_path: recipient.target_path.clone(),
                    created_at: now,
                    split_job_counter: pool_name.split_job_counter,
                    unique_number: pool_name.unique_number,
                    lock_policy: LockPolicy::None,
                    transfer_mode: TransferMode::Image,
                    chmod: None,
                    trans_rename: None,
                    archive_time: 0,
                    header_injection: false,
                    files: moved,
                    restart_names: Vec::new(),
                    pool_dir,
                    attempt: 0,
                    toggle_host: false,
                });
            }
        }

        Ok(outcome)
    }

    fn stat_entries(&self, directory: &Directory, outcome: &mut ScanOutcome) -> Result<Vec<(PathBuf, FileEntry)>, AmgError> {
        let read_dir = fs::read_dir(&directory.path).map_err(|source| AmgError::DirectoryUnreadable {
            path: directory.path.clone(),
            source,
        })?;

        let mut entries = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = match dir_entry {
                Ok(e) => e,
                Err(err) => {
                    outcome.skipped.push((directory.path.clone(), err));
                    continue;
                }
            };
            let path = dir_entry.path();
            let metadata = match dir_entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    outcome.skipped.push((path, err));
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }
            let mtime = match metadata.modified() {
                Ok(m) => m,
                Err(err) => {
                    outcome.skipped.push((path, err));
                    continue;
                }
            };
            entries.push((
                path,
                FileEntry {
                    name: dir_entry.file_name().to_string_lossy().into_owned(),
                    size: metadata.len(),
                    mtime,
                },
            ));
        }
        Ok(entries)
    }

    fn apply_deletion(directory: &Directory, path: &Path, decision: AgeDecision, outcome: &mut ScanOutcome) -> bool {
        let AgeDecision::Delete(reason) = decision else {
            return false;
        };
        let allowed = match reason {
            DeleteReason::OtherDel => directory.delete_flags.contains(afd_core::directory::DeleteFlags::UNKNOWN),
            DeleteReason::AgeOutput => directory.delete_flags.contains(afd_core::directory::DeleteFlags::QUEUED),
            DeleteReason::UserDel => directory.delete_flags.contains(afd_core::directory::DeleteFlags::LOCKED),
            DeleteReason::AgeInput | DeleteReason::FileCurrentlyTransmitted => false,
        };
        if !allowed {
            return false;
        }
        match fs::remove_file(path) {
            Ok(()) => {
                outcome.deletions.push((path.to_path_buf(), reason));
                true
            }
            Err(err) => {
                outcome.skipped.push((path.to_path_buf(), err));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afd_core::directory::{DeleteFlags, Recipient};
    use std::time::Duration;

    fn directory(dir_path: PathBuf, delete_flags: DeleteFlags) -> Directory {
        Directory {
            id: 1,
            path: dir_path,
            old_file_time: Duration::from_secs(3600),
            delete_flags,
            max_copied_files: 10,
            max_copied_bytes: 1 << 20,
            recipients: vec![Recipient {
                host_alias: "h1".into(),
                target_path: "/incoming".into(),
            }],
            disabled: false,
        }
    }

    #[test]
    fn candidates_are_moved_into_a_fresh_pool_dir_and_published_as_a_job() {
        let source = tempfile::tempdir().unwrap();
        let pool_root = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("a.txt"), b"hello").unwrap();

        let scanner = DirectoryScanner::new();
        let dir = directory(source.path().to_path_buf(), DeleteFlags::none());
        let outcome = scanner
            .scan_once(&dir, SystemTime::now(), pool_root.path(), |_| true, {
                let mut id = 0u64;
                move || {
                    id += 1;
                    id
                }
            })
            .unwrap();

        assert_eq!(outcome.jobs.len(), 1);
        let job = &outcome.jobs[0];
        assert_eq!(job.files.len(), 1);
        assert_eq!(job.host_alias, "h1");
        assert!(job.pool_dir.join("a.txt").exists());
        assert!(!source.path().join("a.txt").exists());
    }

    #[test]
    fn aged_unknown_file_is_deleted_when_directory_has_no_recipients() {
        let source = tempfile::tempdir().unwrap();
        let pool_root = tempfile::tempdir().unwrap();
        let path = source.path().join("stale.txt");
        std::fs::write(&path, b"x").unwrap();
        let far_future = SystemTime::now() + Duration::from_secs(7200);

        let scanner = DirectoryScanner::new();
        let mut dir = directory(source.path().to_path_buf(), DeleteFlags::UNKNOWN);
        dir.recipients.clear();

        let outcome = scanner
            .scan_once(&dir, far_future, pool_root.path(), |_| true, || 1)
            .unwrap();

        assert!(outcome.jobs.is_empty());
        assert_eq!(outcome.deletions.len(), 1);
        assert_eq!(outcome.deletions[0].1, DeleteReason::OtherDel);
        assert!(!path.exists());
    }

    #[test]
    fn aged_file_is_kept_when_delete_flag_is_not_set() {
        let source = tempfile::tempdir().unwrap();
        let pool_root = tempfile::tempdir().unwrap();
        let path = source.path().join("stale.txt");
        std::fs::write(&path, b"x").unwrap();
        let far_future = SystemTime::now() + Duration::from_secs(7200);

        let scanner = DirectoryScanner::new();
        let mut dir = directory(source.path().to_path_buf(), DeleteFlags::none());
        dir.recipients.clear();

        let outcome = scanner
            .scan_once(&dir, far_future, pool_root.path(), |_| true, || 1)
            .unwrap();

        assert!(outcome.deletions.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn queued_host_leaves_candidates_unclaimed() {
        let source = tempfile::tempdir().unwrap();
        let pool_root = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("a.txt"), b"hello").unwrap();

        let scanner = DirectoryScanner::new();
        let dir = directory(source.path().to_path_buf(), DeleteFlags::none());
        let outcome = scanner
            .scan_once(&dir, SystemTime::now(), pool_root.path(), |_| false, || 1)
            .unwrap();

        assert!(outcome.jobs.is_empty());
        assert!(source.path().join("a.txt").exists());
    }
}
