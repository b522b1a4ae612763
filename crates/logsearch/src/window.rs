//! Selecting which numbered rotated files a `[start, end]` time window can
//! possibly intersect, by comparing file mtime against `SWITCH_FILE_TIME`
//! instead of opening and scanning every file in the set.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use logging::LogCategory;

use crate::error::LogSearchError;

/// An inclusive `[start, end]` Unix-second time window.
#[derive(Clone, Copy, Debug)]
pub struct TimeWindow {
    pub start: u64,
    pub end: u64,
}

pub(crate) fn numbered_path(dir: &Path, category: LogCategory, n: u32) -> std::path::PathBuf {
    let mut name = dir.join(category.file_stem()).into_os_string();
    name.push(format!(".{n}"));
    std::path::PathBuf::from(name)
}

fn mtime_unix_secs(path: &Path) -> Result<Option<u64>, LogSearchError> {
    match std::fs::metadata(path) {
        Ok(meta) => {
            let mtime = meta.modified().map_err(|source| LogSearchError::Stat { path: path.to_path_buf(), source })?;
            Ok(Some(mtime.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()))
        }
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(LogSearchError::Stat { path: path.to_path_buf(), source }),
    }
}

/// Returns the file numbers (ascending, `.0` first) whose rotation window
/// can contain a record timestamped within `window`.
///
/// A rotated file's mtime is the time its *last* record was written, and
/// (per [`logging::rotation::RotatingLog`]) it was opened roughly
/// `switch_file_time` earlier. A file is out of range only if it closed
/// before `window.start` or was opened after `window.end`; `mtime -
/// switch_file_time` approximates the open time.
pub fn select_files(dir: &Path, category: LogCategory, max_files: u32, switch_file_time: Duration, window: TimeWindow) -> Result<Vec<u32>, LogSearchError> {
    let mut in_range = Vec::new();
    for n in 0..max_files {
        let path = numbered_path(dir, category, n);
        let Some(mtime) = mtime_unix_secs(&path)? else {
            continue;
        };
        let opened_at = mtime.saturating_sub(switch_file_time.as_secs());
        let closed_before_window = mtime < window.start;
        let opened_after_window = opened_at > window.end;
        if closed_before_window || opened_after_window {
            continue;
        }
        in_range.push(n);
    }
    in_range.sort_unstable();
    Ok(in_range)
}

#[must_use]
pub fn epoch(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path, mtime: SystemTime) {
        fs::write(path, b"x").unwrap();
        let file = fs::File::open(path).unwrap();
        file.set_modified(mtime).unwrap();
    }

    #[test]
    fn a_file_entirely_before_the_window_is_excluded() {
        let dir = tempfile::tempdir().unwrap();
        touch(&numbered_path(dir.path(), LogCategory::Transfer, 0), epoch(100));
        let files = select_files(dir.path(), LogCategory::Transfer, 3, Duration::from_secs(10), TimeWindow { start: 1000, end: 2000 }).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn a_file_overlapping_the_window_is_included() {
        let dir = tempfile::tempdir().unwrap();
        touch(&numbered_path(dir.path(), LogCategory::Transfer, 0), epoch(1500));
        let files = select_files(dir.path(), LogCategory::Transfer, 3, Duration::from_secs(10), TimeWindow { start: 1000, end: 2000 }).unwrap();
        assert_eq!(files, vec![0]);
    }

    #[test]
    fn missing_files_are_skipped_without_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(&numbered_path(dir.path(), LogCategory::Transfer, 1), epoch(1500));
        let files = select_files(dir.path(), LogCategory::Transfer, 3, Duration::from_secs(10), TimeWindow { start: 1000, end: 2000 }).unwrap();
        assert_eq!(files, vec![1]);
    }
}
