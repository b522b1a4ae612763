//! Sweeping archive directories whose retention window has elapsed.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

/// Removes every bucket directory (`<root>/<host>/<scheme>/<bucket>`) whose
/// bucket is older than `now - archive_time`, for every host and scheme
/// already present under `root`. Per-file `archive_time` lives on the job
/// that created a directory, not on the directory itself, so a sweep is
/// always run with one retention value at a time; a caller with several
/// distinct `archive_time`s in play runs one sweep per value.
///
/// A directory that cannot be read or removed is logged and skipped
/// rather than aborting the rest of the sweep.
#[must_use]
pub fn sweep(root: &Path, now: SystemTime, archive_time: u64) -> Vec<PathBuf> {
    let now_secs = now.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_secs();
    let cutoff = now_secs.saturating_sub(archive_time);
    let mut removed = Vec::new();
    for host_dir in list_dirs(root) {
        for scheme_dir in list_dirs(&host_dir) {
            for bucket_dir in list_dirs(&scheme_dir) {
                let Some(bucket) = bucket_dir.file_name().and_then(|n| n.to_str()).and_then(|n| n.parse::<u64>().ok()) else {
                    continue;
                };
                if bucket >= cutoff {
                    continue;
                }
                match fs::remove_dir_all(&bucket_dir) {
                    Ok(()) => {
                        debug!(path = %bucket_dir.display(), bucket, cutoff, "removed expired archive bucket");
                        removed.push(bucket_dir);
                    }
                    Err(source) => warn!(path = %bucket_dir.display(), %source, "could not remove expired archive bucket"),
                }
            }
        }
    }
    removed
}

fn list_dirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect()
}
